//! Per-stage progress bars.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} [{bar:40}] {pos}/{len} batches ({elapsed})";

/// Number of batches needed for `items` items, used as the bar length.
pub fn estimated_batches(items: usize, batch_size: usize) -> u64 {
    items.div_ceil(batch_size.max(1)) as u64
}

/// Bar counting the batches of one stage. Drawn to stderr, and hidden
/// automatically when stderr is not a terminal.
pub fn stage_bar(message: &'static str, total_batches: u64) -> ProgressBar {
    let bar = ProgressBar::new(total_batches);
    if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(message);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_does_not_overcount_even_division() {
        assert_eq!(estimated_batches(512, 256), 2);
        assert_eq!(estimated_batches(513, 256), 3);
        assert_eq!(estimated_batches(0, 256), 0);
        assert_eq!(estimated_batches(3, 2), 2);
    }

    #[test]
    fn template_is_valid() {
        assert!(ProgressStyle::default_bar().template(TEMPLATE).is_ok());
    }
}
