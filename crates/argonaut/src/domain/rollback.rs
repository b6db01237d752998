/// One deployment-history row offered for rollback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollbackRow {
    pub id: i64,
    pub revision: String,
    pub deployed_at: String,
    pub source: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub message: Option<String>,
    pub meta_error: Option<String>,
}

/// Sub-state of the rollback overlay: picking a row or confirming it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RollbackPhase {
    #[default]
    List,
    Confirm,
}

/// State of the rollback overlay for one application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollbackState {
    pub app_name: String,
    pub rows: Vec<RollbackRow>,
    pub current_revision: Option<String>,
    pub selected_idx: usize,
    pub phase: RollbackPhase,
    pub loading: bool,
    pub prune: bool,
    pub watch: bool,
    pub dry_run: bool,
    pub confirm_selected: bool,
    pub error: Option<String>,
}

impl RollbackState {
    /// Creates a loading state for the given app.
    pub fn loading_for(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            loading: true,
            ..Self::default()
        }
    }

    /// Returns the row the cursor is on, if any.
    pub fn selected_row(&self) -> Option<&RollbackRow> {
        self.rows.get(self.selected_idx)
    }

    /// Applies revision metadata fetched after the history list loaded.
    ///
    /// Rows are matched by history id; missing rows are ignored because the
    /// list may have been reloaded meanwhile.
    pub fn apply_revision_meta(
        &mut self,
        id: i64,
        author: Option<String>,
        date: Option<String>,
        message: Option<String>,
    ) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.id == id) {
            row.author = author;
            row.date = date;
            row.message = message;
        }
    }

    /// Records a metadata fetch failure on the matching row.
    pub fn apply_revision_meta_error(&mut self, id: i64, error: String) {
        if let Some(row) = self.rows.iter_mut().find(|row| row.id == id) {
            row.meta_error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_revision_meta_matches_by_id() {
        // Arrange
        let mut state = RollbackState {
            rows: vec![
                RollbackRow {
                    id: 7,
                    revision: "abc".to_string(),
                    ..RollbackRow::default()
                },
                RollbackRow {
                    id: 8,
                    revision: "def".to_string(),
                    ..RollbackRow::default()
                },
            ],
            ..RollbackState::default()
        };

        // Act
        state.apply_revision_meta(8, Some("dev".to_string()), None, Some("fix".to_string()));

        // Assert
        assert!(state.rows[0].author.is_none());
        assert_eq!(state.rows[1].author.as_deref(), Some("dev"));
        assert_eq!(state.rows[1].message.as_deref(), Some("fix"));
    }

    #[test]
    fn test_apply_revision_meta_ignores_unknown_id() {
        // Arrange
        let mut state = RollbackState::default();

        // Act
        state.apply_revision_meta(1, None, None, None);
        state.apply_revision_meta_error(1, "gone".to_string());

        // Assert
        assert!(state.rows.is_empty());
    }
}
