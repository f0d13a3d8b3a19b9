use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_YOUTUBE_URL: &str = "https://www.youtube.com/watch?v=6E_161JvL2Q";
pub const DEFAULT_START_TIME: &str = "00:01:30";
pub const DEFAULT_END_TIME: &str = "00:02:30";
pub const DEFAULT_VIDEO_FILE: &str = "final_video.mp4";

/// Name the backend gives the rendered output in its file list.
pub const FINAL_VIDEO_ENTRY: &str = "Final Video";

pub const STEP_COUNT: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub wait_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub step_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
    pub video_file: String,
    pub download_dir: std::path::PathBuf,
}

/// One stage of the production pipeline, in backend numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Download,
    Cut,
    ExtractGerman,
    EditGerman,
    Translate,
    EditArabic,
    CreateAss,
    ProduceVideo,
}

impl Step {
    pub const ALL: [Step; STEP_COUNT] = [
        Step::Download,
        Step::Cut,
        Step::ExtractGerman,
        Step::EditGerman,
        Step::Translate,
        Step::EditArabic,
        Step::CreateAss,
        Step::ProduceVideo,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Step> {
        Step::ALL.get(index).copied()
    }

    /// Steps 3 and 5 are done by a human in the subtitle editors.
    pub fn is_manual_edit(self) -> bool {
        matches!(self, Step::EditGerman | Step::EditArabic)
    }

    /// Steps that `run_all_steps` drives, in order.
    pub fn automatic() -> impl Iterator<Item = Step> {
        Step::ALL.into_iter().filter(|s| !s.is_manual_edit())
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Download => "Download video",
            Step::Cut => "Cut segment",
            Step::ExtractGerman => "Extract German subtitles",
            Step::EditGerman => "Edit German subtitles",
            Step::Translate => "Translate to Arabic",
            Step::EditArabic => "Edit Arabic subtitles",
            Step::CreateAss => "Create ASS subtitles",
            Step::ProduceVideo => "Produce final video",
        }
    }

    /// Editor that a manual step hands over to.
    pub fn editor_lang(self) -> Option<SubtitleLang> {
        match self {
            Step::EditGerman => Some(SubtitleLang::German),
            Step::EditArabic => Some(SubtitleLang::Arabic),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.index() + 1, self.label())
    }
}

impl FromStr for Step {
    type Err = String;

    /// Accepts the backend index (`0`..`7`) or a short name such as `cut`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<usize>() {
            return Step::from_index(n).ok_or_else(|| format!("step index {n} out of range 0-7"));
        }
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "download" => Ok(Step::Download),
            "cut" => Ok(Step::Cut),
            "extract" | "extract-german" | "transcribe" => Ok(Step::ExtractGerman),
            "edit-german" => Ok(Step::EditGerman),
            "translate" => Ok(Step::Translate),
            "edit-arabic" => Ok(Step::EditArabic),
            "ass" | "create-ass" => Ok(Step::CreateAss),
            "produce" | "produce-video" | "render" => Ok(Step::ProduceVideo),
            other => Err(format!("unknown step '{other}'")),
        }
    }
}

/// Per-step state as reported by the backend.
///
/// The wire format is a glyph string; anything unrecognised (including an
/// empty string or `null`) counts as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum StepStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Error,
}

impl StepStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            StepStatus::Pending => "○",
            StepStatus::Processing => "⏳",
            StepStatus::Success => "✓",
            StepStatus::Error => "✗",
        }
    }

    pub fn from_glyph(s: &str) -> StepStatus {
        match s.trim() {
            "✓" => StepStatus::Success,
            "✗" => StepStatus::Error,
            "⏳" => StepStatus::Processing,
            _ => StepStatus::Pending,
        }
    }
}

impl From<Option<String>> for StepStatus {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(StepStatus::from_glyph).unwrap_or_default()
    }
}

impl From<StepStatus> for String {
    fn from(status: StepStatus) -> Self {
        status.glyph().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleLang {
    German,
    Arabic,
}

impl SubtitleLang {
    pub fn as_path(self) -> &'static str {
        match self {
            SubtitleLang::German => "german",
            SubtitleLang::Arabic => "arabic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubtitleLang::German => "German",
            SubtitleLang::Arabic => "Arabic",
        }
    }
}

impl FromStr for SubtitleLang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "german" | "de" => Ok(SubtitleLang::German),
            "arabic" | "ar" => Ok(SubtitleLang::Arabic),
            other => Err(format!("unknown subtitle language '{other}' (use german or arabic)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "file", default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exists: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: String,
}

/// The backend's view of the pipeline at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub step_status: Vec<StepStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<String>,
    // Kept optional: an empty list still replaces the file view, a missing one does not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileInfo>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_processing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub german_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic_content: Option<String>,
}

impl PipelineSnapshot {
    pub fn status_of(&self, step: Step) -> StepStatus {
        self.step_status
            .get(step.index())
            .copied()
            .unwrap_or_default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `POST /api/step/{n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    pub url: String,
    pub start_time: String,
    pub end_time: String,
}

/// Free-text url/start/end fields as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepInputs {
    pub url: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl StepInputs {
    /// Apply the fallback defaults to empty or missing fields.
    pub fn resolve(&self) -> StepRequest {
        fn pick(v: &Option<String>, default: &str) -> String {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        }
        StepRequest {
            url: pick(&self.url, DEFAULT_YOUTUBE_URL),
            start_time: pick(&self.start, DEFAULT_START_TIME),
            end_time: pick(&self.end, DEFAULT_END_TIME),
        }
    }
}

/// `{message}` reply shared by the mutating endpoints. `{error}` replies
/// never get this far; the client turns them into `ApiError::Backend`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveFileRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsReply {
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<String>,
}

/// How a single `run_step` call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    /// Input validation failed; nothing was sent.
    Rejected(String),
    /// The start request failed or the backend refused it.
    Failed(String),
    /// The backend went idle; carries the step's final status.
    Finished(StepStatus),
    /// The bounded wait expired while the backend was still busy.
    TimedOut,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            StepOutcome::Finished(StepStatus::Success) | StepOutcome::Finished(StepStatus::Pending)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn title(self) -> &'static str {
        match self {
            NoticeLevel::Info => "Info",
            NoticeLevel::Success => "Success",
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
        }
    }
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn to_message(&self) -> String {
        format!("{}: {}", self.level.title(), self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorOrigin {
    Loaded,
    Reloaded,
    Synced,
}

impl EditorOrigin {
    pub fn label(self) -> &'static str {
        match self {
            EditorOrigin::Loaded => "loaded",
            EditorOrigin::Reloaded => "reloaded",
            EditorOrigin::Synced => "synced",
        }
    }
}

/// State changes emitted by the controller and applied by presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent {
    StepStatus {
        step: Step,
        status: StepStatus,
    },
    Logs(Vec<String>),
    Files(Vec<FileInfo>),
    EditorContent {
        lang: SubtitleLang,
        content: String,
        origin: EditorOrigin,
    },
    Busy(bool),
    Notice(Notice),
    PreviewAvailable {
        url: String,
    },
    VideoSelected {
        filename: String,
        url: Option<String>,
    },
    DownloadProgress {
        bytes: u64,
        total: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_status_decodes_glyphs_and_falls_back_to_pending() {
        let raw = r#"["✓", "✗", "⏳", "", "○", null, "???"]"#;
        let parsed: Vec<StepStatus> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed,
            vec![
                StepStatus::Success,
                StepStatus::Error,
                StepStatus::Processing,
                StepStatus::Pending,
                StepStatus::Pending,
                StepStatus::Pending,
                StepStatus::Pending,
            ]
        );
    }

    #[test]
    fn snapshot_tolerates_missing_and_null_fields() {
        let empty: PipelineSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, PipelineSnapshot::default());

        let partial: PipelineSnapshot =
            serde_json::from_str(r#"{"step_status": null, "logs": null, "is_processing": null}"#)
                .unwrap();
        assert!(partial.step_status.is_empty());
        assert!(partial.logs.is_empty());
        assert!(!partial.is_processing);
        assert!(partial.files.is_none());
    }

    #[test]
    fn file_info_reads_backend_field_names() {
        let raw = r#"{"name": "Final Video", "file": "final_video.mp4", "size": "3.20 MB", "exists": true}"#;
        let info: FileInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.path, "final_video.mp4");
        assert!(info.exists);

        let sparse: FileInfo = serde_json::from_str(r#"{"name": "ASS Subtitles"}"#).unwrap();
        assert!(!sparse.exists);
        assert_eq!(sparse.size, "");
    }

    #[test]
    fn inputs_fall_back_to_defaults_when_blank() {
        let inputs = StepInputs {
            url: Some("   ".into()),
            start: None,
            end: Some(" 00:03:00 ".into()),
        };
        let req = inputs.resolve();
        assert_eq!(req.url, DEFAULT_YOUTUBE_URL);
        assert_eq!(req.start_time, DEFAULT_START_TIME);
        assert_eq!(req.end_time, "00:03:00");
    }

    #[test]
    fn steps_parse_from_index_and_name() {
        assert_eq!("1".parse::<Step>(), Ok(Step::Cut));
        assert_eq!("produce-video".parse::<Step>(), Ok(Step::ProduceVideo));
        assert!("8".parse::<Step>().is_err());
        assert_eq!(
            Step::automatic().map(Step::index).collect::<Vec<_>>(),
            vec![0, 1, 2, 4, 6, 7]
        );
    }
}
