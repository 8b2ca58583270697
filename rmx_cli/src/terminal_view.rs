use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use rmx_core::upload::binder::ProgressView;
use rmx_core::upload::projector::RenderDirective;

/// Renders one media item's upload progress as an indicatif bar.
///
/// Indeterminate steps show a spinner, determinate steps a 0–100% bar.
pub struct TerminalProgressView {
    bar: ProgressBar,
}

impl TerminalProgressView {
    pub fn new(name: &str) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_prefix(name.to_string());
        bar.set_style(spinner_style());
        Self { bar }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressView for TerminalProgressView {
    fn render(&self, directive: &RenderDirective) {
        match directive {
            RenderDirective::ShowIndeterminate { label } => {
                self.bar.set_style(spinner_style());
                self.bar.enable_steady_tick(Duration::from_millis(100));
                self.bar.set_message(label.to_string());
            }
            RenderDirective::ShowDeterminate { label, percent } => {
                self.bar.disable_steady_tick();
                self.bar.set_style(bar_style());
                self.bar.set_position(u64::from(*percent));
                self.bar.set_message(label.to_string());
            }
            RenderDirective::ShowError { message } => {
                self.bar.disable_steady_tick();
                self.bar.abandon_with_message(format!("Failed: {}", message));
            }
            RenderDirective::Hide => {
                self.bar.disable_steady_tick();
                self.bar.finish_and_clear();
            }
        }
    }
}
