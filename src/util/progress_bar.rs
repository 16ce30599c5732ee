
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// Shared function to pull our record spinner styling; the record total is unknown while streaming
pub fn get_spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {spinner:.cyan} {pos} records; Speed: {per_sec} {msg}")
        .unwrap()
        .with_key("per_sec", |state: &ProgressState, w: &mut dyn std::fmt::Write| write!(w, "{:.0}/s", state.per_sec()).unwrap())
}

/// Creates a record spinner, or a hidden one when progress output is disabled
/// # Arguments
/// * `enabled` - if false, the returned bar draws nothing
/// * `message` - label shown beside the counts
pub fn record_spinner(enabled: bool, message: &str) -> ProgressBar {
    if enabled {
        let spinner = ProgressBar::new_spinner()
            .with_style(get_spinner_style())
            .with_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(200));
        spinner
    } else {
        ProgressBar::hidden()
    }
}
