pub(crate) mod diff_view;
pub(crate) mod footer_bar;
pub(crate) mod lists;
pub(crate) mod overlays;
pub(crate) mod rollback_view;
pub(crate) mod status_bar;
pub(crate) mod tree_view;

use ratatui::layout::Rect;

/// Centers a box of the given size within `area`, clamped to fit.
pub(crate) fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_clamped_to_area() {
        // Arrange
        let area = Rect {
            x: 0,
            y: 0,
            width: 20,
            height: 10,
        };

        // Act
        let rect = centered_rect(area, 100, 100);

        // Assert
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 10);
        assert_eq!(rect.x, 0);
    }

    #[test]
    fn test_centered_rect_centers_smaller_boxes() {
        // Arrange
        let area = Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 24,
        };

        // Act
        let rect = centered_rect(area, 40, 10);

        // Assert
        assert_eq!(rect.x, 20);
        assert_eq!(rect.y, 7);
    }
}
