//! CLI-specific progress handling for butterfly-osrm
//!
//! Shows a spinner on stderr while a spawned engine loads its dataset.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a spinner for CLI display with elapsed time
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Spinner shown for the duration of engine startup
pub struct StartupSpinner {
    pub pb: ProgressBar,
}

impl StartupSpinner {
    /// Start ticking immediately
    pub fn start(message: &str) -> Self {
        let pb = create_spinner(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }

    /// Remove the spinner without a final message
    pub fn abandon(self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner_template() {
        let pb = create_spinner("Loading monaco.osrm");

        // A spinner has no length and keeps its message
        assert_eq!(pb.length(), None);
        assert_eq!(pb.message(), "Loading monaco.osrm");
        pb.finish();
    }

    #[test]
    fn test_startup_spinner_finish() {
        let spinner = StartupSpinner::start("Starting osrm-routed");
        assert!(!spinner.pb.is_finished());

        let pb = spinner.pb.clone();
        spinner.finish("Engine ready");
        assert!(pb.is_finished());
    }
}
