use std::time::{SystemTime, UNIX_EPOCH};

/// The list the main viewport is currently showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum View {
    Clusters,
    Namespaces,
    Projects,
    ApplicationSets,
    #[default]
    Apps,
    Tree,
}

impl View {
    /// Returns the view one scope level up, if any.
    ///
    /// Drill-up order mirrors the scope chain: tree → apps → projects →
    /// namespaces → clusters. Application sets sit beside projects and
    /// drill up to namespaces as well.
    pub fn parent(self) -> Option<View> {
        match self {
            View::Tree => Some(View::Apps),
            View::Apps => Some(View::Projects),
            View::Projects | View::ApplicationSets => Some(View::Namespaces),
            View::Namespaces => Some(View::Clusters),
            View::Clusters => None,
        }
    }

    /// Returns the title shown above the viewport.
    pub fn title(self) -> &'static str {
        match self {
            View::Clusters => "Clusters",
            View::Namespaces => "Namespaces",
            View::Projects => "Projects",
            View::ApplicationSets => "ApplicationSets",
            View::Apps => "Applications",
            View::Tree => "Resources",
        }
    }
}

/// Cursor, scroll, and gesture state for the active viewport.
///
/// The `last_*_pressed` fields carry unix-millisecond timestamps so
/// double-key gestures (`gg`, `ZZ`) and the Esc debounce never rely on
/// wall-clock timers running on the loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    pub view: View,
    pub selected_idx: usize,
    pub scroll_offset: usize,
    pub last_g_pressed: u64,
    pub last_z_pressed: u64,
    pub last_esc_pressed: u64,
}

/// Window within which the second key of a double-key gesture counts.
pub const DOUBLE_KEY_WINDOW_MS: u64 = 500;

/// Global debounce applied to Esc so key-repeat cannot flood drill-ups.
pub const ESC_DEBOUNCE_MS: u64 = 100;

/// Returns the current unix time in milliseconds.
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

impl Navigation {
    /// Resets cursor and scroll, keeping the current view.
    pub fn reset_cursor(&mut self) {
        self.selected_idx = 0;
        self.scroll_offset = 0;
    }

    /// Switches views and resets the cursor.
    pub fn go_to(&mut self, view: View) {
        self.view = view;
        self.reset_cursor();
    }

    /// Records a `g` press and reports whether it completes a `gg` gesture.
    pub fn register_g(&mut self, now_ms: u64) -> bool {
        let doubled = now_ms.saturating_sub(self.last_g_pressed) <= DOUBLE_KEY_WINDOW_MS
            && self.last_g_pressed != 0;
        self.last_g_pressed = if doubled { 0 } else { now_ms };

        doubled
    }

    /// Records a `Z` press and reports whether it completes a `ZZ` gesture.
    pub fn register_z(&mut self, now_ms: u64) -> bool {
        let doubled = now_ms.saturating_sub(self.last_z_pressed) <= DOUBLE_KEY_WINDOW_MS
            && self.last_z_pressed != 0;
        self.last_z_pressed = if doubled { 0 } else { now_ms };

        doubled
    }

    /// Applies the Esc debounce; returns `true` when the press should be
    /// handled.
    pub fn register_esc(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_esc_pressed) < ESC_DEBOUNCE_MS {
            return false;
        }
        self.last_esc_pressed = now_ms;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_g_detects_double_tap_within_window() {
        // Arrange
        let mut navigation = Navigation::default();

        // Act
        let first = navigation.register_g(1_000);
        let second = navigation.register_g(1_300);

        // Assert
        assert!(!first);
        assert!(second);
    }

    #[test]
    fn test_register_g_ignores_slow_second_tap() {
        // Arrange
        let mut navigation = Navigation::default();

        // Act
        navigation.register_g(1_000);
        let second = navigation.register_g(1_000 + DOUBLE_KEY_WINDOW_MS + 1);

        // Assert
        assert!(!second);
    }

    #[test]
    fn test_completed_gesture_resets_so_a_third_tap_starts_over() {
        // Arrange
        let mut navigation = Navigation::default();
        navigation.register_g(1_000);
        navigation.register_g(1_100);

        // Act
        let third = navigation.register_g(1_200);

        // Assert
        assert!(!third);
    }

    #[test]
    fn test_register_esc_debounces_key_repeat() {
        // Arrange
        let mut navigation = Navigation::default();

        // Act
        let first = navigation.register_esc(5_000);
        let repeat = navigation.register_esc(5_000 + ESC_DEBOUNCE_MS - 1);
        let later = navigation.register_esc(5_000 + ESC_DEBOUNCE_MS + 10);

        // Assert
        assert!(first);
        assert!(!repeat);
        assert!(later);
    }

    #[test]
    fn test_parent_chain_ends_at_clusters() {
        // Assert
        assert_eq!(View::Tree.parent(), Some(View::Apps));
        assert_eq!(View::Apps.parent(), Some(View::Projects));
        assert_eq!(View::Projects.parent(), Some(View::Namespaces));
        assert_eq!(View::Namespaces.parent(), Some(View::Clusters));
        assert_eq!(View::Clusters.parent(), None);
    }
}
