//! Command loop between the interactive UI and the status-sync controller.
//!
//! Every command runs as its own task so a long step wait never blocks the
//! next keypress. Overlapping commands are allowed; their events simply
//! interleave and the last one wins in the view.

use super::sync::Controller;
use crate::model::{Step, StepInputs, SubtitleLang};
use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    RunStep(Step, StepInputs),
    RunAll(StepInputs),
    LoadFile(SubtitleLang),
    SaveFile(SubtitleLang, String),
    ReloadFile(SubtitleLang),
    /// Save the editor content and continue the pipeline from that language.
    Proceed(SubtitleLang, String, StepInputs),
    RefreshAll,
    RefreshFiles,
    FetchLogs,
    /// Already confirmed by the user.
    ClearFiles,
    SelectVideo(String),
    DownloadVideo,
    Quit,
}

async fn execute(controller: Controller, cmd: UiCommand) {
    let res: Result<()> = match cmd {
        UiCommand::RunStep(step, inputs) => {
            let outcome = controller.run_step(step, &inputs).await;
            debug!(step = step.index(), ?outcome, "step finished");
            Ok(())
        }
        UiCommand::RunAll(inputs) => {
            let outcomes = controller.run_all_steps(&inputs).await;
            debug!(?outcomes, "run-all finished");
            Ok(())
        }
        UiCommand::LoadFile(lang) => controller.load_file(lang).await.map(|_| ()),
        UiCommand::SaveFile(lang, content) => {
            controller.save_file(lang, &content).await.map(|_| ())
        }
        UiCommand::ReloadFile(lang) => controller.reload_file(lang).await.map(|_| ()),
        UiCommand::Proceed(lang, content, inputs) => {
            let outcomes = match lang {
                SubtitleLang::German => controller.proceed_from_german(&content, &inputs).await,
                SubtitleLang::Arabic => controller.proceed_to_video(&content, &inputs).await,
            };
            debug!(?outcomes, "proceed finished");
            Ok(())
        }
        UiCommand::RefreshAll => controller.refresh_all().await.map(|_| ()),
        UiCommand::RefreshFiles => controller.refresh_files().await.map(|_| ()),
        UiCommand::FetchLogs => controller.fetch_logs().await.map(|_| ()),
        UiCommand::ClearFiles => controller.clear_files(|| true).await.map(|_| ()),
        UiCommand::SelectVideo(name) => controller.select_video(&name).map(|_| ()),
        UiCommand::DownloadVideo => controller.download_video(None).await.map(|_| ()),
        UiCommand::Quit => Ok(()),
    };
    // User-facing failures were already reported as notices.
    if let Err(e) = res {
        warn!("command failed: {e:#}");
    }
}

/// Poll in the background and dispatch UI commands until the UI quits.
pub(crate) async fn run_controller(
    controller: Controller,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    controller.start_polling();
    let mut tasks = JoinSet::new();
    tasks.spawn(execute(controller.clone(), UiCommand::RefreshAll));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Quit) | None => break,
                    Some(cmd) => {
                        debug!(?cmd, "dispatching");
                        tasks.spawn(execute(controller.clone(), cmd));
                    }
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!("command task panicked: {e}");
                    }
                }
            }
        }
    }

    // Step waits are not user-cancellable, but quitting the app ends them.
    tasks.abort_all();
    if controller.is_polling() {
        controller.stop_polling();
    }
    Ok(())
}
