use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use rmx_core::signout::api::HttpSignOutApi;
use rmx_core::signout::cleanup::FileSessionCleanup;
use rmx_core::signout::task::SignOutTask;
use rmx_core::types::types::{MediaSource, SignOutParams, TransferId, TransferState};
use rmx_core::upload::binder::{ProgressView, UploadProgressBinder};
use rmx_core::upload::tracker::UploadStateTracker;

mod json_view;
mod terminal_view;
use json_view::JsonProgressView;
use terminal_view::TerminalProgressView;

#[derive(Parser)]
#[command(name = "rmx", about = "Matrix client session and upload tooling")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign out of the homeserver and delete the local session data
    SignOut {
        /// Homeserver base URL
        #[arg(long, env = "RMX_HOMESERVER", required_unless_present = "local_only")]
        homeserver: Option<String>,

        #[arg(
            long,
            env = "RMX_ACCESS_TOKEN",
            hide_env_values = true,
            required_unless_present = "local_only"
        )]
        access_token: Option<String>,

        /// Directory holding the session's local data
        #[arg(long, env = "RMX_SESSION_DIR")]
        session_dir: PathBuf,

        /// Only delete local data, do not contact the homeserver
        #[arg(long)]
        local_only: bool,
    },

    /// Feed a simulated upload through the progress tracker
    SimulateUpload {
        /// File size in bytes
        #[arg(short, long, default_value = "4194304")]
        size: u64,

        /// Thumbnail size in bytes, 0 for no thumbnail
        #[arg(long, default_value = "65536")]
        thumbnail_size: u64,

        /// Bytes reported per progress step
        #[arg(long, default_value = "262144")]
        chunk: u64,

        /// End the upload with a failure instead of success
        #[arg(long)]
        fail: bool,

        /// Print one JSON render directive per line instead of a progress bar
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::SignOut {
            homeserver,
            access_token,
            session_dir,
            local_only,
        } => sign_out(homeserver, access_token, session_dir, local_only).await,
        Command::SimulateUpload {
            size,
            thumbnail_size,
            chunk,
            fail,
            json,
        } => {
            simulate_upload(size, thumbnail_size, chunk.max(1), fail, json).await;
            ExitCode::SUCCESS
        }
    }
}

async fn sign_out(
    homeserver: Option<String>,
    access_token: Option<String>,
    session_dir: PathBuf,
    local_only: bool,
) -> ExitCode {
    let cleanup = Arc::new(FileSessionCleanup::new(session_dir));
    let task = if local_only {
        SignOutTask::local_only(cleanup)
    } else {
        let (Some(homeserver), Some(access_token)) = (homeserver, access_token) else {
            eprintln!("Invalid configuration: --homeserver and --access-token are required");
            return ExitCode::from(2);
        };
        match HttpSignOutApi::new(&homeserver, access_token) {
            Ok(api) => SignOutTask::new(Arc::new(api), cleanup),
            Err(e) => {
                eprintln!("Invalid configuration: {}", e);
                return ExitCode::from(2);
            }
        }
    };

    let start = Instant::now();
    match task
        .execute(SignOutParams {
            sign_out_from_homeserver: !local_only,
        })
        .await
    {
        Ok(()) => {
            println!("Signed out in {:.2}s", start.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Sign out failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Plays the role of the upload pipeline: emits the states of one upload on
/// a channel drained by the tracker, with a terminal view bound to it.
async fn simulate_upload(size: u64, thumbnail_size: u64, chunk: u64, fail: bool, json: bool) {
    let tracker = Arc::new(UploadStateTracker::new());
    let binder = UploadProgressBinder::new(Arc::clone(&tracker));
    let id = TransferId::new(uuid::Uuid::new_v4().to_string());

    let view: Arc<dyn ProgressView> = if json {
        Arc::new(JsonProgressView::new(id.clone()))
    } else {
        Arc::new(TerminalProgressView::new("[upload]"))
    };
    binder.bind(id.clone(), MediaSource::Local, view);

    let (state_tx, state_rx) = mpsc::channel(64);
    let runner = tokio::spawn(Arc::clone(&tracker).run(state_rx));

    let step = Duration::from_millis(40);
    let mut states = vec![TransferState::Idle];
    if thumbnail_size > 0 {
        states.push(TransferState::EncryptingThumbnail);
        states.extend(progress_steps(thumbnail_size, chunk, |current, total| {
            TransferState::UploadingThumbnail { current, total }
        }));
    }
    states.push(TransferState::Encrypting);
    states.extend(progress_steps(size, chunk, |current, total| TransferState::Uploading {
        current,
        total,
    }));
    states.push(if fail {
        TransferState::failure(std::io::Error::other("simulated upload failure"))
    } else {
        TransferState::Success
    });

    for state in states {
        if state_tx.send((id.clone(), state)).await.is_err() {
            log::error!("tracker stopped before the upload finished");
            break;
        }
        tokio::time::sleep(step).await;
    }
    drop(state_tx);
    let _ = runner.await;

    binder.unbind(&id);
    if !json {
        println!("Upload {} {}", id, if fail { "failed" } else { "completed" });
    }
}

fn progress_steps(
    total: u64,
    chunk: u64,
    make: impl Fn(u64, u64) -> TransferState,
) -> Vec<TransferState> {
    let mut steps = Vec::new();
    let mut current = 0;
    loop {
        steps.push(make(current, total));
        if current >= total {
            break;
        }
        current = (current + chunk).min(total);
    }
    steps
}
