use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Render a 1-5 rating as filled and hollow stars; an unrated book gets an
/// empty string so list rows stay compact.
pub(crate) fn stars(rating: Option<u8>) -> String {
    match rating {
        Some(rating @ 1..=5) => {
            let filled = usize::from(rating);
            format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
        }
        _ => String::new(),
    }
}

/// Build a proportional bar of `#` characters for the statistics screen. The
/// largest count in a histogram gets the full `width`; every count of at
/// least one gets at least one character.
pub(crate) fn bar(count: usize, max: usize, width: usize) -> String {
    if count == 0 || max == 0 || width == 0 {
        return String::new();
    }
    let scaled = (count * width).div_ceil(max).min(width);
    "#".repeat(scaled.max(1))
}

/// Produce a rectangle centered within `area` that spans the requested
/// percent of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_render_filled_and_hollow() {
        assert_eq!(stars(Some(3)), "★★★☆☆");
        assert_eq!(stars(Some(5)), "★★★★★");
        assert_eq!(stars(None), "");
        assert_eq!(stars(Some(9)), "");
    }

    #[test]
    fn bars_scale_to_the_largest_count() {
        assert_eq!(bar(4, 4, 10).len(), 10);
        assert_eq!(bar(0, 4, 10), "");
        assert!(!bar(1, 100, 10).is_empty());
    }
}
