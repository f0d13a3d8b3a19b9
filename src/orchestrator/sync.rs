//! Status-sync controller.
//!
//! Owns the polling loop and the selected preview video, and turns backend
//! replies into [`SyncEvent`]s. Presentation layers apply those events; the
//! controller never touches a view directly.

use crate::api::{ApiError, BackendClient};
use crate::model::{
    ControllerConfig, EditorOrigin, FileInfo, Notice, NoticeLevel, PipelineSnapshot, Step,
    StepInputs, StepOutcome, StepStatus, SubtitleLang, SyncEvent, FINAL_VIDEO_ENTRY,
};
use crate::timecode;
use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Emit a progress event at most once per this many bytes.
const DOWNLOAD_PROGRESS_STEP: u64 = 1024 * 1024;

#[derive(Clone)]
pub(crate) struct Controller {
    inner: Arc<Inner>,
}

struct Inner {
    client: BackendClient,
    cfg: ControllerConfig,
    event_tx: UnboundedSender<SyncEvent>,
    selected_video: Mutex<String>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self
            .poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Controller {
    pub fn new(cfg: ControllerConfig, event_tx: UnboundedSender<SyncEvent>) -> Result<Self> {
        let client = BackendClient::new(&cfg).context("create backend client")?;
        let selected_video = Mutex::new(cfg.video_file.clone());
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                cfg,
                event_tx,
                selected_video,
                poller: Mutex::new(None),
            }),
        })
    }

    fn emit(&self, ev: SyncEvent) {
        // A closed channel only means nobody is watching any more.
        let _ = self.inner.event_tx.send(ev);
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(SyncEvent::Notice(Notice {
            level,
            message: message.into(),
        }));
    }

    fn set_step(&self, step: Step, status: StepStatus) {
        self.emit(SyncEvent::StepStatus { step, status });
    }

    fn emit_step_statuses(&self, statuses: &[StepStatus]) {
        for (index, status) in statuses.iter().enumerate() {
            if let Some(step) = Step::from_index(index) {
                self.set_step(step, *status);
            }
        }
    }

    fn emit_files(&self, files: Vec<FileInfo>) {
        let final_ready = files
            .iter()
            .any(|f| f.name == FINAL_VIDEO_ENTRY && f.exists);
        self.emit(SyncEvent::Files(files));
        if final_ready {
            if let Ok(url) = self.video_url() {
                self.emit(SyncEvent::PreviewAvailable {
                    url: url.to_string(),
                });
            }
        }
    }

    // ---- polling lifecycle ----

    /// Start the periodic status poll. A no-op while a poller is already running.
    pub fn start_polling(&self) {
        let mut slot = lock(&self.inner.poller);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.cfg.poll_interval.max(Duration::from_millis(1));
        debug!(?period, "starting status poller");
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // The poller must not keep the controller alive on its own.
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let ctl = Controller { inner };
                if let Err(e) = ctl.poll().await {
                    warn!("status poll failed: {e:#}");
                }
            }
        }));
    }

    pub fn stop_polling(&self) {
        if let Some(handle) = lock(&self.inner.poller).take() {
            debug!("stopping status poller");
            handle.abort();
        }
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Fetch one snapshot and reconcile it into events.
    pub async fn poll(&self) -> Result<PipelineSnapshot> {
        let snapshot = self
            .inner
            .client
            .status()
            .await
            .context("fetch pipeline status")?;
        self.emit_step_statuses(&snapshot.step_status);
        if !snapshot.logs.is_empty() {
            self.emit(SyncEvent::Logs(snapshot.logs.clone()));
        }
        if let Some(files) = snapshot.files.clone() {
            self.emit_files(files);
        }
        Ok(snapshot)
    }

    pub async fn refresh_all(&self) -> Result<PipelineSnapshot> {
        let snapshot = self
            .inner
            .client
            .refresh()
            .await
            .context("refresh pipeline data")?;
        self.emit_step_statuses(&snapshot.step_status);
        if let Some(files) = snapshot.files.clone() {
            self.emit_files(files);
        }
        for (lang, content) in [
            (SubtitleLang::German, &snapshot.german_content),
            (SubtitleLang::Arabic, &snapshot.arabic_content),
        ] {
            if let Some(content) = content.as_ref().filter(|c| !c.is_empty()) {
                self.emit(SyncEvent::EditorContent {
                    lang,
                    content: content.clone(),
                    origin: EditorOrigin::Synced,
                });
            }
        }
        debug!("data refreshed");
        Ok(snapshot)
    }

    pub async fn refresh_files(&self) -> Result<Vec<FileInfo>> {
        let files = self
            .inner
            .client
            .files_info()
            .await
            .context("fetch files info")?;
        self.emit_files(files.clone());
        Ok(files)
    }

    pub async fn fetch_logs(&self) -> Result<Vec<String>> {
        let logs = self.inner.client.logs().await.context("fetch logs")?;
        self.emit(SyncEvent::Logs(logs.clone()));
        Ok(logs)
    }

    // ---- steps ----

    pub async fn run_step(&self, step: Step, inputs: &StepInputs) -> StepOutcome {
        let request = inputs.resolve();
        info!(
            step = step.index(),
            url = %request.url,
            start = %request.start_time,
            end = %request.end_time,
            "running step"
        );

        if step == Step::Cut && !timecode::validate_times(&request.start_time, &request.end_time)
        {
            let msg = "End time must be after start time";
            self.notice(NoticeLevel::Error, msg);
            return StepOutcome::Rejected(msg.to_string());
        }

        self.set_step(step, StepStatus::Processing);
        self.emit(SyncEvent::Busy(true));

        match self.inner.client.start_step(step, &request).await {
            Ok(message) => self.notice(NoticeLevel::Success, message),
            Err(e) => {
                warn!(step = step.index(), "step request failed: {e}");
                let message = e.user_message();
                self.notice(NoticeLevel::Error, message.clone());
                self.set_step(step, StepStatus::Error);
                self.emit(SyncEvent::Busy(false));
                return StepOutcome::Failed(message);
            }
        }

        match self.wait_for_completion().await {
            Some(snapshot) => StepOutcome::Finished(snapshot.status_of(step)),
            None => StepOutcome::TimedOut,
        }
    }

    /// Poll until the backend reports idle or the wait budget runs out.
    ///
    /// Always lowers the busy indicator before returning. Returns the final
    /// snapshot, or `None` on timeout.
    pub async fn wait_for_completion(&self) -> Option<PipelineSnapshot> {
        let interval = self.inner.cfg.wait_interval.max(Duration::from_millis(1));
        let max_wait = self.inner.cfg.wait_timeout;
        let mut waited = Duration::ZERO;

        while waited < max_wait {
            tokio::time::sleep(interval).await;
            waited += interval;

            match self.inner.client.status().await {
                Ok(snapshot) => {
                    self.emit_step_statuses(&snapshot.step_status);
                    if !snapshot.is_processing {
                        self.emit(SyncEvent::Busy(false));
                        return Some(snapshot);
                    }
                }
                Err(e) => warn!("error polling status: {e}"),
            }
        }

        warn!(?max_wait, "processing wait timed out");
        self.emit(SyncEvent::Busy(false));
        None
    }

    /// Run every non-manual step in order. A failed step does not stop the rest.
    pub async fn run_all_steps(&self, inputs: &StepInputs) -> Vec<(Step, StepOutcome)> {
        self.notice(NoticeLevel::Info, "Running all steps automatically…");
        let mut outcomes = Vec::new();
        for step in Step::automatic() {
            let outcome = self.run_step(step, inputs).await;
            outcomes.push((step, outcome));
            tokio::time::sleep(self.inner.cfg.step_delay).await;
        }
        outcomes
    }

    async fn run_sequence(&self, steps: &[Step], inputs: &StepInputs) -> Vec<(Step, StepOutcome)> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for &step in steps {
            outcomes.push((step, self.run_step(step, inputs).await));
        }
        outcomes
    }

    /// Save the German edit, then translate, build the ASS file and render.
    pub async fn proceed_from_german(
        &self,
        content: &str,
        inputs: &StepInputs,
    ) -> Vec<(Step, StepOutcome)> {
        if let Err(e) = self.save_file(SubtitleLang::German, content).await {
            debug!("continuing after failed save: {e:#}");
        }
        self.run_sequence(
            &[Step::Translate, Step::CreateAss, Step::ProduceVideo],
            inputs,
        )
        .await
    }

    /// Save the Arabic edit, then build the ASS file and render.
    pub async fn proceed_to_video(
        &self,
        content: &str,
        inputs: &StepInputs,
    ) -> Vec<(Step, StepOutcome)> {
        if let Err(e) = self.save_file(SubtitleLang::Arabic, content).await {
            debug!("continuing after failed save: {e:#}");
        }
        self.run_sequence(&[Step::CreateAss, Step::ProduceVideo], inputs)
            .await
    }

    // ---- subtitle files ----

    pub async fn load_file(&self, lang: SubtitleLang) -> Result<Option<String>> {
        match self.inner.client.file(lang).await {
            Ok(content) if !content.is_empty() => {
                self.emit(SyncEvent::EditorContent {
                    lang,
                    content: content.clone(),
                    origin: EditorOrigin::Loaded,
                });
                self.notice(NoticeLevel::Success, "File loaded");
                Ok(Some(content))
            }
            Ok(_) => {
                self.notice(NoticeLevel::Warning, "File not found");
                Ok(None)
            }
            Err(e) => {
                warn!(lang = lang.as_path(), "error loading file: {e}");
                self.notice(NoticeLevel::Error, "Failed to load file");
                Err(e).with_context(|| format!("load {} subtitles", lang.label()))
            }
        }
    }

    pub async fn save_file(&self, lang: SubtitleLang, content: &str) -> Result<String> {
        match self.inner.client.save_file(lang, content).await {
            Ok(message) => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Saved".to_string());
                self.notice(NoticeLevel::Success, message.clone());
                Ok(message)
            }
            Err(e) => {
                warn!(lang = lang.as_path(), "error saving file: {e}");
                self.notice(NoticeLevel::Error, "Failed to save file");
                Err(e).with_context(|| format!("save {} subtitles", lang.label()))
            }
        }
    }

    pub async fn reload_file(&self, lang: SubtitleLang) -> Result<Option<String>> {
        let content = self
            .inner
            .client
            .reload_file(lang)
            .await
            .with_context(|| format!("reload {} subtitles", lang.label()))?;
        if content.is_empty() {
            return Ok(None);
        }
        self.emit(SyncEvent::EditorContent {
            lang,
            content: content.clone(),
            origin: EditorOrigin::Reloaded,
        });
        Ok(Some(content))
    }

    // ---- housekeeping ----

    /// Delete every generated file after `confirm` agrees. Returns whether
    /// anything was requested.
    pub async fn clear_files(&self, confirm: impl FnOnce() -> bool) -> Result<bool> {
        if !confirm() {
            return Ok(false);
        }
        let message = match self.inner.client.clear().await {
            Ok(m) => m,
            Err(e) => {
                warn!("error clearing files: {e}");
                self.notice(NoticeLevel::Error, "Failed to delete files");
                return Err(e).context("clear generated files");
            }
        };
        self.notice(NoticeLevel::Success, message);
        if let Err(e) = self.refresh_all().await {
            warn!("refresh after clear failed: {e:#}");
        }
        for step in Step::ALL {
            self.set_step(step, StepStatus::Pending);
        }
        Ok(true)
    }

    // ---- video preview ----

    pub fn selected_video(&self) -> String {
        lock(&self.inner.selected_video).clone()
    }

    pub fn video_url(&self) -> Result<Url, ApiError> {
        self.inner.client.asset_url(&self.selected_video())
    }

    /// Point the preview at another file in the backend's directory.
    pub fn select_video(&self, name: &str) -> Result<String> {
        let filename = Path::new(name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .filter(|n| !n.is_empty());
        let Some(filename) = filename else {
            bail!("'{name}' is not a file name");
        };
        *lock(&self.inner.selected_video) = filename.clone();
        self.notice(NoticeLevel::Success, format!("Selected: {filename}"));
        self.emit(SyncEvent::VideoSelected {
            filename: filename.clone(),
            url: self.video_url().ok().map(|u| u.to_string()),
        });
        Ok(filename)
    }

    /// Fetch the selected video into `dest_dir` (the configured download
    /// directory when `None`).
    pub async fn download_video(&self, dest_dir: Option<&Path>) -> Result<PathBuf> {
        let filename = self.selected_video();
        let dir = dest_dir.unwrap_or(&self.inner.cfg.download_dir);
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create {}", dir.display()))?;
        let dest = dir.join(&filename);

        self.notice(NoticeLevel::Info, "Downloading video…");
        let mut reported = 0u64;
        let result = self
            .inner
            .client
            .download(&filename, &dest, |bytes, total| {
                if bytes - reported >= DOWNLOAD_PROGRESS_STEP || Some(bytes) == total {
                    reported = bytes;
                    self.emit(SyncEvent::DownloadProgress { bytes, total });
                }
            })
            .await;

        match result {
            Ok(bytes) => {
                info!(dest = %dest.display(), bytes, "video downloaded");
                self.notice(
                    NoticeLevel::Success,
                    format!(
                        "Saved {} ({})",
                        dest.display(),
                        timecode::format_file_size(bytes)
                    ),
                );
                Ok(dest)
            }
            Err(e) => {
                warn!("video download failed: {e}");
                self.notice(NoticeLevel::Error, e.user_message());
                Err(e).with_context(|| format!("download {filename}"))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
