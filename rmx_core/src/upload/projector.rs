use std::fmt;

use serde::Serialize;

use crate::types::types::{MediaSource, TransferState};

/// Text shown next to the progress indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProgressLabel {
    Idle,
    EncryptingThumbnail,
    SendingThumbnail { current: u64, total: u64 },
    EncryptingFile,
    SendingFile { current: u64, total: u64 },
}

impl fmt::Display for ProgressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressLabel::Idle => f.write_str("Waiting…"),
            ProgressLabel::EncryptingThumbnail => f.write_str("Encrypting thumbnail…"),
            ProgressLabel::SendingThumbnail { current, total } => write!(
                f,
                "Sending thumbnail ({} / {})",
                format_bytes(*current),
                format_bytes(*total)
            ),
            ProgressLabel::EncryptingFile => f.write_str("Encrypting file…"),
            ProgressLabel::SendingFile { current, total } => write!(
                f,
                "Sending file ({} / {})",
                format_bytes(*current),
                format_bytes(*total)
            ),
        }
    }
}

/// What the progress area of a media item should display.
///
/// Directives are idempotent: rendering the same one twice leaves the view
/// as rendering it once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderDirective {
    ShowIndeterminate { label: ProgressLabel },
    ShowDeterminate { label: ProgressLabel, percent: u8 },
    ShowError { message: String },
    Hide,
}

/// Maps one upload state onto a render directive.
///
/// | State                  | Directive                                    |
/// |------------------------|----------------------------------------------|
/// | `Idle` (local media)   | `ShowIndeterminate(Idle)`                    |
/// | `Idle` (remote media)  | `Hide`                                       |
/// | `EncryptingThumbnail`  | `ShowIndeterminate(EncryptingThumbnail)`     |
/// | `UploadingThumbnail`   | `ShowDeterminate(SendingThumbnail, %)`       |
/// | `Encrypting`           | `ShowIndeterminate(EncryptingFile)`          |
/// | `Uploading`            | `ShowDeterminate(SendingFile, %)`            |
/// | `Success`              | `Hide`                                       |
/// | `Failure`              | `ShowError(cause)`                           |
pub fn project(state: &TransferState, media: MediaSource) -> RenderDirective {
    match state {
        TransferState::Idle => match media {
            MediaSource::Local => RenderDirective::ShowIndeterminate {
                label: ProgressLabel::Idle,
            },
            MediaSource::Remote => RenderDirective::Hide,
        },
        TransferState::EncryptingThumbnail => RenderDirective::ShowIndeterminate {
            label: ProgressLabel::EncryptingThumbnail,
        },
        TransferState::UploadingThumbnail { current, total } => RenderDirective::ShowDeterminate {
            label: ProgressLabel::SendingThumbnail {
                current: *current,
                total: *total,
            },
            percent: percent(*current, *total),
        },
        TransferState::Encrypting => RenderDirective::ShowIndeterminate {
            label: ProgressLabel::EncryptingFile,
        },
        TransferState::Uploading { current, total } => RenderDirective::ShowDeterminate {
            label: ProgressLabel::SendingFile {
                current: *current,
                total: *total,
            },
            percent: percent(*current, *total),
        },
        TransferState::Success => RenderDirective::Hide,
        TransferState::Failure { cause } => RenderDirective::ShowError {
            message: cause.to_string(),
        },
    }
}

/// `round(100 * current / total)` clamped to `0..=100`; an unknown (zero)
/// total reads as 0%.
pub fn percent(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let total = u128::from(total);
    let scaled = (u128::from(current) * 100 + total / 2) / total;
    scaled.min(100) as u8
}

/// Short human-readable byte size.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.0} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
