//! Line rendering for text mode.
//!
//! Turns snapshots, outcomes and controller events into human-readable lines.
//! Nothing here writes; callers route the lines to stdout/stderr.

use crate::model::{FileInfo, PipelineSnapshot, Step, StepOutcome, StepStatus, SyncEvent, STEP_COUNT};
use crate::timecode::format_file_size;

pub(crate) fn step_line(step: Step, snapshot: &PipelineSnapshot) -> String {
    format!("  [{}] {}", snapshot.status_of(step).glyph(), step)
}

/// Steps, processing flag and file list of a snapshot.
pub(crate) fn snapshot_lines(snapshot: &PipelineSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Pipeline: {}",
        if snapshot.is_processing {
            "processing"
        } else {
            "idle"
        }
    ));
    for step in Step::ALL {
        lines.push(step_line(step, snapshot));
    }
    if let Some(files) = snapshot.files.as_deref() {
        lines.push("Files:".to_string());
        lines.extend(files_lines(files));
    }
    lines
}

pub(crate) fn files_lines(files: &[FileInfo]) -> Vec<String> {
    if files.is_empty() {
        return vec!["  (no files)".to_string()];
    }
    files
        .iter()
        .map(|f| {
            format!(
                "  {} {}: {} ({})",
                if f.exists { "✓" } else { "○" },
                f.name,
                f.path,
                if f.size.is_empty() { "N/A" } else { &f.size }
            )
        })
        .collect()
}

pub(crate) fn outcome_line(step: Step, outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Rejected(msg) => format!("{step}: rejected ({msg})"),
        StepOutcome::Failed(msg) => format!("{step}: failed ({msg})"),
        StepOutcome::Finished(status) => format!("{step}: finished [{}]", status.glyph()),
        StepOutcome::TimedOut => format!("{step}: still processing after wait timeout"),
    }
}

/// Progress line for an event, or `None` for events text mode does not echo.
pub(crate) fn event_line(ev: &SyncEvent) -> Option<String> {
    match ev {
        SyncEvent::Notice(n) => Some(n.to_message()),
        SyncEvent::Busy(true) => Some("Processing…".to_string()),
        SyncEvent::PreviewAvailable { url } => Some(format!("Preview: {url}")),
        SyncEvent::DownloadProgress { bytes, total } => Some(match total {
            Some(t) => format!(
                "Downloaded {} / {}",
                format_file_size(*bytes),
                format_file_size(*t)
            ),
            None => format!("Downloaded {}", format_file_size(*bytes)),
        }),
        SyncEvent::StepStatus { .. }
        | SyncEvent::Logs(_)
        | SyncEvent::Files(_)
        | SyncEvent::EditorContent { .. }
        | SyncEvent::Busy(false)
        | SyncEvent::VideoSelected { .. } => None,
    }
}

/// Tracks what `watch` already printed so each poll only reports changes.
#[derive(Debug, Default)]
pub(crate) struct ChangeTracker {
    statuses: [StepStatus; STEP_COUNT],
    last_log: Option<String>,
    files: Vec<FileInfo>,
}

impl ChangeTracker {
    pub(crate) fn apply(&mut self, ev: &SyncEvent) -> Vec<String> {
        match ev {
            SyncEvent::StepStatus { step, status } => {
                let slot = &mut self.statuses[step.index()];
                if slot == status {
                    return Vec::new();
                }
                *slot = *status;
                vec![format!("[{}] {}", status.glyph(), step)]
            }
            SyncEvent::Logs(logs) => {
                // The backend returns a sliding window; print what follows
                // the last line already shown.
                let start = self
                    .last_log
                    .as_ref()
                    .and_then(|last| logs.iter().rposition(|l| l == last))
                    .map_or(0, |p| p + 1);
                if let Some(last) = logs.last() {
                    self.last_log = Some(last.clone());
                }
                logs[start..].iter().map(|l| format!("log: {l}")).collect()
            }
            SyncEvent::Files(files) => {
                if *files == self.files {
                    return Vec::new();
                }
                self.files = files.clone();
                let mut lines = vec!["Files:".to_string()];
                lines.extend(files_lines(files));
                lines
            }
            other => event_line(other).into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Notice, NoticeLevel};

    #[test]
    fn snapshot_lists_every_step_with_its_glyph() {
        let snapshot = PipelineSnapshot {
            step_status: vec![StepStatus::Success, StepStatus::Processing],
            is_processing: true,
            ..Default::default()
        };
        let lines = snapshot_lines(&snapshot);
        assert_eq!(lines[0], "Pipeline: processing");
        assert_eq!(lines[1], "  [✓] 1. Download video");
        assert_eq!(lines[2], "  [⏳] 2. Cut segment");
        assert_eq!(lines[8], "  [○] 8. Produce final video");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn files_render_missing_size_as_na() {
        let files = vec![FileInfo {
            name: "German SRT".into(),
            path: "cut_de.srt".into(),
            exists: false,
            size: String::new(),
        }];
        assert_eq!(files_lines(&files), vec!["  ○ German SRT: cut_de.srt (N/A)"]);
        assert_eq!(files_lines(&[]), vec!["  (no files)"]);
    }

    #[test]
    fn only_user_visible_events_are_echoed() {
        let notice = SyncEvent::Notice(Notice {
            level: NoticeLevel::Error,
            message: "End time must be after start time".into(),
        });
        assert_eq!(
            event_line(&notice).as_deref(),
            Some("Error: End time must be after start time")
        );
        assert_eq!(event_line(&SyncEvent::Busy(false)), None);
        assert_eq!(
            outcome_line(Step::Cut, &StepOutcome::TimedOut),
            "2. Cut segment: still processing after wait timeout"
        );
    }

    #[test]
    fn watch_reports_only_changes() {
        let mut tracker = ChangeTracker::default();
        let processing = SyncEvent::StepStatus {
            step: Step::Translate,
            status: StepStatus::Processing,
        };
        assert_eq!(tracker.apply(&processing), vec!["[⏳] 5. Translate to Arabic"]);
        assert!(tracker.apply(&processing).is_empty());

        let logs = |v: &[&str]| SyncEvent::Logs(v.iter().map(|s| s.to_string()).collect());
        assert_eq!(tracker.apply(&logs(&["a", "b"])), vec!["log: a", "log: b"]);
        assert_eq!(tracker.apply(&logs(&["b", "c"])), vec!["log: c"]);
        assert!(tracker.apply(&logs(&["b", "c"])).is_empty());

        assert!(tracker.apply(&SyncEvent::Files(Vec::new())).is_empty());
        assert!(tracker.apply(&SyncEvent::Busy(false)).is_empty());
    }
}
