use serde::Serialize;

use rmx_core::types::types::TransferId;
use rmx_core::upload::binder::ProgressView;
use rmx_core::upload::projector::RenderDirective;

#[derive(Serialize)]
struct DirectiveLine<'a> {
    transfer: &'a TransferId,
    directive: &'a RenderDirective,
}

/// Writes every render directive as one JSON line on stdout, for scripts
/// that drive their own UI.
pub struct JsonProgressView {
    transfer: TransferId,
}

impl JsonProgressView {
    pub fn new(transfer: TransferId) -> Self {
        Self { transfer }
    }

    fn line(&self, directive: &RenderDirective) -> serde_json::Result<String> {
        serde_json::to_string(&DirectiveLine {
            transfer: &self.transfer,
            directive,
        })
    }
}

impl ProgressView for JsonProgressView {
    fn render(&self, directive: &RenderDirective) {
        match self.line(directive) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("[JsonProgressView] failed to encode {:?}: {}", directive, e),
        }
    }
}
