/// State of the inline diff viewer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffState {
    pub title: String,
    pub content: Vec<String>,
    pub offset: usize,
    pub loading: bool,
    pub search_query: String,
    /// `/` was pressed; keystrokes edit the search query until Enter.
    pub searching: bool,
}

impl DiffState {
    /// Creates a loading placeholder shown while manifests are fetched.
    pub fn loading_for(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            loading: true,
            ..Self::default()
        }
    }

    /// Returns line indices matching the active search query.
    pub fn matching_lines(&self) -> Vec<usize> {
        if self.search_query.is_empty() {
            return Vec::new();
        }
        let query = self.search_query.to_lowercase();

        self.content
            .iter()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&query))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Moves the viewport to the first line matching the search query.
    pub fn jump_to_first_match(&mut self) {
        if let Some(first) = self.matching_lines().first() {
            self.offset = *first;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_to_first_match_moves_offset() {
        // Arrange
        let mut diff = DiffState {
            content: vec![
                "--- live".to_string(),
                "+++ desired".to_string(),
                "+replicas: 3".to_string(),
            ],
            search_query: "replicas".to_string(),
            ..DiffState::default()
        };

        // Act
        diff.jump_to_first_match();

        // Assert
        assert_eq!(diff.offset, 2);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        // Arrange
        let diff = DiffState {
            content: vec!["a".to_string()],
            ..DiffState::default()
        };

        // Assert
        assert!(diff.matching_lines().is_empty());
    }
}
