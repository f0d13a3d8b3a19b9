use super::editor::TextBuffer;
use crate::model::{
    EditorOrigin, FileInfo, Notice, Step, StepInputs, StepStatus, SubtitleLang, SyncEvent,
    DEFAULT_END_TIME, DEFAULT_START_TIME, DEFAULT_YOUTUBE_URL, STEP_COUNT,
};
use std::time::{Duration, Instant};

pub const TAB_PROCESS: usize = 0;
pub const TAB_GERMAN: usize = 1;
pub const TAB_ARABIC: usize = 2;
pub const TAB_PREVIEW: usize = 3;
pub const TAB_HELP: usize = 4;
pub const TAB_COUNT: usize = 5;

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

pub const LOG_CLEARED: &str = "Log cleared";

/// Step input field being edited on the Process tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Url,
    Start,
    End,
}

impl InputField {
    pub fn next(self) -> InputField {
        match self {
            InputField::Url => InputField::Start,
            InputField::Start => InputField::End,
            InputField::End => InputField::Url,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputField::Url => "YouTube URL",
            InputField::Start => "Start",
            InputField::End => "End",
        }
    }
}

pub struct ShownNotice {
    pub notice: Notice,
    /// Local wall-clock time the notice arrived, `HH:MM:SS`.
    pub stamp: String,
    pub at: Instant,
}

pub struct EditorState {
    pub buffer: TextBuffer,
    pub origin: Option<EditorOrigin>,
}

pub struct UiState {
    pub tab: usize,
    pub statuses: [StepStatus; STEP_COUNT],
    pub selected_step: usize,
    pub busy: bool,
    pub logs: Vec<String>,
    pub files: Vec<FileInfo>,

    pub url: String,
    pub start: String,
    pub end: String,
    pub editing_input: Option<InputField>,

    pub german: EditorState,
    pub arabic: EditorState,

    pub video_file: String,
    /// Filename being typed on the Preview tab.
    pub video_input: Option<String>,
    pub preview_url: Option<String>,
    pub download: Option<(u64, Option<u64>)>,

    /// Waiting for y/n after asking to delete all files.
    pub confirm_clear: bool,
    pub notice: Option<ShownNotice>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: TAB_PROCESS,
            statuses: [StepStatus::Pending; STEP_COUNT],
            selected_step: 0,
            busy: false,
            logs: Vec::new(),
            files: Vec::new(),
            url: DEFAULT_YOUTUBE_URL.to_string(),
            start: DEFAULT_START_TIME.to_string(),
            end: DEFAULT_END_TIME.to_string(),
            editing_input: None,
            german: EditorState {
                buffer: TextBuffer::default(),
                origin: None,
            },
            arabic: EditorState {
                buffer: TextBuffer::default(),
                origin: None,
            },
            video_file: String::new(),
            video_input: None,
            preview_url: None,
            download: None,
            confirm_clear: false,
            notice: None,
        }
    }
}

fn clock_stamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let format = time::macros::format_description!("[hour]:[minute]:[second]");
    now.format(format).unwrap_or_default()
}

impl UiState {
    pub fn selected(&self) -> Step {
        Step::from_index(self.selected_step).unwrap_or(Step::Download)
    }

    pub fn inputs(&self) -> StepInputs {
        StepInputs {
            url: Some(self.url.clone()),
            start: Some(self.start.clone()),
            end: Some(self.end.clone()),
        }
    }

    pub fn input_mut(&mut self, field: InputField) -> &mut String {
        match field {
            InputField::Url => &mut self.url,
            InputField::Start => &mut self.start,
            InputField::End => &mut self.end,
        }
    }

    pub fn editor(&self, lang: SubtitleLang) -> &EditorState {
        match lang {
            SubtitleLang::German => &self.german,
            SubtitleLang::Arabic => &self.arabic,
        }
    }

    pub fn editor_mut(&mut self, lang: SubtitleLang) -> &mut EditorState {
        match lang {
            SubtitleLang::German => &mut self.german,
            SubtitleLang::Arabic => &mut self.arabic,
        }
    }

    /// Language of the editor tab currently shown, if any.
    pub fn editor_tab(&self) -> Option<SubtitleLang> {
        match self.tab {
            TAB_GERMAN => Some(SubtitleLang::German),
            TAB_ARABIC => Some(SubtitleLang::Arabic),
            _ => None,
        }
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(ShownNotice {
            notice,
            stamp: clock_stamp(),
            at: Instant::now(),
        });
    }

    pub fn visible_notice(&self, now: Instant) -> Option<&ShownNotice> {
        self.notice
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.at) < NOTICE_TTL)
    }

    pub fn clear_logs(&mut self) {
        self.logs = vec![LOG_CLEARED.to_string()];
    }

    pub fn apply_event(&mut self, ev: SyncEvent) {
        match ev {
            SyncEvent::StepStatus { step, status } => {
                self.statuses[step.index()] = status;
            }
            SyncEvent::Logs(logs) => {
                self.logs = logs;
            }
            SyncEvent::Files(files) => {
                self.files = files;
            }
            SyncEvent::EditorContent {
                lang,
                content,
                origin,
            } => {
                let editor = self.editor_mut(lang);
                editor.buffer.set_text(&content);
                editor.origin = Some(origin);
            }
            SyncEvent::Busy(busy) => {
                self.busy = busy;
            }
            SyncEvent::Notice(notice) => self.show_notice(notice),
            SyncEvent::PreviewAvailable { url } => {
                self.preview_url = Some(url);
            }
            SyncEvent::VideoSelected { filename, url } => {
                self.video_file = filename;
                self.preview_url = url;
            }
            SyncEvent::DownloadProgress { bytes, total } => {
                self.download = Some((bytes, total));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoticeLevel;

    #[test]
    fn defaults_prefill_step_inputs() {
        let state = UiState::default();
        let req = state.inputs().resolve();
        assert_eq!(req.url, DEFAULT_YOUTUBE_URL);
        assert_eq!(req.start_time, DEFAULT_START_TIME);
        assert_eq!(req.end_time, DEFAULT_END_TIME);
        assert_eq!(state.selected(), Step::Download);
    }

    #[test]
    fn events_update_the_matching_view_state() {
        let mut state = UiState::default();
        state.apply_event(SyncEvent::StepStatus {
            step: Step::Translate,
            status: StepStatus::Success,
        });
        state.apply_event(SyncEvent::Busy(true));
        state.apply_event(SyncEvent::EditorContent {
            lang: SubtitleLang::Arabic,
            content: "1\nمرحبا".into(),
            origin: EditorOrigin::Loaded,
        });
        state.apply_event(SyncEvent::PreviewAvailable {
            url: "http://localhost:5001/final_video.mp4".into(),
        });

        assert_eq!(state.statuses[4], StepStatus::Success);
        assert!(state.busy);
        assert_eq!(state.arabic.buffer.text(), "1\nمرحبا");
        assert_eq!(state.arabic.origin, Some(EditorOrigin::Loaded));
        assert!(state.german.buffer.is_empty());
        assert!(state.preview_url.is_some());

        state.apply_event(SyncEvent::VideoSelected {
            filename: "other.mp4".into(),
            url: None,
        });
        assert_eq!(state.video_file, "other.mp4");
        assert_eq!(state.preview_url, None);
    }

    #[test]
    fn cleared_log_stays_until_next_snapshot() {
        let mut state = UiState::default();
        state.apply_event(SyncEvent::Logs(vec!["Step 1 started".into()]));
        state.clear_logs();
        assert_eq!(state.logs, vec![LOG_CLEARED]);
        state.apply_event(SyncEvent::Logs(vec!["Step 2 started".into()]));
        assert_eq!(state.logs, vec!["Step 2 started"]);
    }

    #[test]
    fn notices_expire_after_ttl() {
        let mut state = UiState::default();
        state.apply_event(SyncEvent::Notice(Notice {
            level: NoticeLevel::Success,
            message: "German SRT saved".into(),
        }));
        let shown_at = state.notice.as_ref().map(|n| n.at).unwrap();
        assert!(state.visible_notice(shown_at).is_some());
        assert!(state.visible_notice(shown_at + NOTICE_TTL).is_none());
        assert_eq!(state.notice.as_ref().unwrap().stamp.len(), 8);
    }

    #[test]
    fn input_fields_cycle() {
        let mut state = UiState::default();
        let field = InputField::End.next();
        assert_eq!(field, InputField::Url);
        state.input_mut(InputField::Start).push('0');
        assert_eq!(state.start, "00:01:300");
    }
}
