use crate::model::{
    ControllerConfig, Step, StepInputs, StepOutcome, SubtitleLang, SyncEvent, DEFAULT_VIDEO_FILE,
};
use crate::orchestrator::Controller;
use crate::text_output::{self, ChangeTracker};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "karaoke-dash",
    version,
    about = "Dashboard for the karaoke video production backend"
)]
pub struct Cli {
    /// Base URL of the pipeline backend
    #[arg(long, global = true, default_value = "http://localhost:5001")]
    pub base_url: String,

    /// YouTube URL sent with step requests (backend default when empty)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Cut start time (H:M:S, M:S or seconds)
    #[arg(long, global = true)]
    pub start: Option<String>,

    /// Cut end time (H:M:S, M:S or seconds)
    #[arg(long, global = true)]
    pub end: Option<String>,

    /// Video file to preview or download
    #[arg(long, global = true, default_value = DEFAULT_VIDEO_FILE)]
    pub video: String,

    /// Status poll interval
    #[arg(long, global = true, default_value = "2s")]
    pub poll_interval: humantime::Duration,

    /// Longest time to wait for a step to finish
    #[arg(long, global = true, default_value = "5m")]
    pub wait_timeout: humantime::Duration,

    /// Status poll interval while waiting for a step
    #[arg(long, global = true, default_value = "1s")]
    pub wait_interval: humantime::Duration,

    /// Pause between steps when running all of them
    #[arg(long, global = true, default_value = "1s")]
    pub step_delay: humantime::Duration,

    /// Timeout for individual API requests
    #[arg(long, global = true, default_value = "30s")]
    pub request_timeout: humantime::Duration,

    /// Where downloaded videos go (defaults to the user's download directory)
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Print JSON results (no TUI)
    #[arg(long, global = true)]
    pub json: bool,

    /// Print text results (no TUI)
    #[arg(long, global = true)]
    pub text: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the current pipeline snapshot
    Status,
    /// Run one pipeline step (index 0-7 or name, e.g. `cut`) and wait for it
    Run { step: Step },
    /// Run every automatic step in order, skipping the manual edit steps
    RunAll,
    /// Save edited subtitles, then continue the pipeline from that language
    Proceed {
        lang: SubtitleLang,
        /// Read the subtitles from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Subtitle file operations
    #[command(subcommand)]
    File(FileCommand),
    /// List generated files
    Files,
    /// Print the backend log
    Logs,
    /// Delete every generated file
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Preview video helpers
    #[command(subcommand)]
    Video(VideoCommand),
    /// Poll the backend and print changes until interrupted
    Watch,
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Debug, Subcommand, Clone)]
pub enum FileCommand {
    /// Print the subtitle file stored on the backend
    Show { lang: SubtitleLang },
    /// Replace the subtitle file on the backend
    Save {
        lang: SubtitleLang,
        /// Read the content from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Ask the backend to re-read the file from disk and print it
    Reload { lang: SubtitleLang },
}

#[derive(Debug, Subcommand, Clone)]
pub enum VideoCommand {
    /// Print the URL of the selected video
    Url,
    /// Download the selected video
    Download {
        /// Target directory
        #[arg(long)]
        dest: Option<PathBuf>,
    },
}

impl Cli {
    /// Whether this invocation opens the terminal dashboard.
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && self.command.is_none() && !self.json && !self.text
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text cannot be used together"));
    }

    let command = match args.command.clone() {
        Some(command) => command,
        None => {
            if !args.json && !args.text {
                #[cfg(feature = "tui")]
                {
                    return crate::tui::run(args).await;
                }
            }
            // Fallback when built without TUI support or asked for plain output.
            Command::Watch
        }
    };

    run_command(&args, command).await
}

/// Build a `ControllerConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ControllerConfig {
    ControllerConfig {
        base_url: args.base_url.clone(),
        poll_interval: Duration::from(args.poll_interval),
        wait_timeout: Duration::from(args.wait_timeout),
        wait_interval: Duration::from(args.wait_interval),
        step_delay: Duration::from(args.step_delay),
        request_timeout: Duration::from(args.request_timeout),
        user_agent: format!("karaoke-dash/{}", env!("CARGO_PKG_VERSION")),
        video_file: args.video.clone(),
        download_dir: args
            .download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

pub fn step_inputs(args: &Cli) -> StepInputs {
    StepInputs {
        url: args.url.clone(),
        start: args.start.clone(),
        end: args.end.clone(),
    }
}

async fn run_command(args: &Cli, command: Command) -> Result<()> {
    let cfg = build_config(args);
    if let Command::Config = command {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<SyncEvent>();
    let controller = Controller::new(cfg, evt_tx)?;

    let watching = matches!(command, Command::Watch);
    let echo_tx = out_tx.clone();
    let echo = tokio::spawn(async move {
        let mut tracker = ChangeTracker::default();
        while let Some(ev) = evt_rx.recv().await {
            if watching {
                for line in tracker.apply(&ev) {
                    let _ = echo_tx.send(OutputLine::Stdout(line));
                }
            } else if let Some(line) = text_output::event_line(&ev) {
                let _ = echo_tx.send(OutputLine::Stderr(line));
            }
        }
    });

    let res = execute(args, &controller, command, &out_tx).await;

    // Dropping the controller closes the event channel and ends the echo task.
    drop(controller);
    let _ = echo.await;
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn execute(
    args: &Cli,
    controller: &Controller,
    command: Command,
    out: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    let print = |line: String| {
        let _ = out.send(OutputLine::Stdout(line));
    };
    let print_json = |value: &serde_json::Value| -> Result<()> {
        print(serde_json::to_string_pretty(value)?);
        Ok(())
    };
    let inputs = step_inputs(args);

    match command {
        Command::Status => {
            let snapshot = controller.poll().await?;
            if args.json {
                print_json(&serde_json::to_value(&snapshot)?)?;
            } else {
                text_output::snapshot_lines(&snapshot)
                    .into_iter()
                    .for_each(print);
            }
        }
        Command::Run { step } => {
            let outcome = controller.run_step(step, &inputs).await;
            report_outcomes(args, &[(step, outcome)], print, print_json)?;
        }
        Command::RunAll => {
            let outcomes = controller.run_all_steps(&inputs).await;
            report_outcomes(args, &outcomes, print, print_json)?;
        }
        Command::Proceed { lang, input } => {
            let content = read_content(input.as_deref()).await?;
            let outcomes = match lang {
                SubtitleLang::German => controller.proceed_from_german(&content, &inputs).await,
                SubtitleLang::Arabic => controller.proceed_to_video(&content, &inputs).await,
            };
            report_outcomes(args, &outcomes, print, print_json)?;
        }
        Command::File(FileCommand::Show { lang }) => {
            let Some(content) = controller.load_file(lang).await? else {
                bail!("{} subtitles not found on the backend", lang.label());
            };
            if args.json {
                print_json(&serde_json::json!({ "lang": lang, "content": content }))?;
            } else {
                print(content);
            }
        }
        Command::File(FileCommand::Save { lang, input }) => {
            let content = read_content(input.as_deref()).await?;
            let message = controller.save_file(lang, &content).await?;
            if args.json {
                print_json(&serde_json::json!({ "message": message }))?;
            }
        }
        Command::File(FileCommand::Reload { lang }) => {
            let content = controller.reload_file(lang).await?.unwrap_or_default();
            if args.json {
                print_json(&serde_json::json!({ "lang": lang, "content": content }))?;
            } else {
                print(content);
            }
        }
        Command::Files => {
            let files = controller.refresh_files().await?;
            if args.json {
                print_json(&serde_json::to_value(&files)?)?;
            } else {
                text_output::files_lines(&files).into_iter().for_each(print);
            }
        }
        Command::Logs => {
            let logs = controller.fetch_logs().await?;
            if args.json {
                print_json(&serde_json::json!({ "logs": logs }))?;
            } else {
                logs.into_iter().for_each(print);
            }
        }
        Command::Clear { yes } => {
            let confirmed = yes
                || tokio::task::spawn_blocking(|| confirm("Delete all generated files?"))
                    .await
                    .context("confirmation prompt failed")??;
            if !controller.clear_files(move || confirmed).await? {
                print("Cancelled".to_string());
            }
        }
        Command::Video(VideoCommand::Url) => {
            print(controller.video_url()?.to_string());
        }
        Command::Video(VideoCommand::Download { dest }) => {
            let path = controller.download_video(dest.as_deref()).await?;
            print(path.display().to_string());
        }
        Command::Watch => {
            controller.start_polling();
            tokio::signal::ctrl_c()
                .await
                .context("wait for Ctrl-C")?;
            controller.stop_polling();
        }
        Command::Config => {}
    }
    Ok(())
}

fn report_outcomes(
    args: &Cli,
    outcomes: &[(Step, StepOutcome)],
    print: impl Fn(String),
    print_json: impl Fn(&serde_json::Value) -> Result<()>,
) -> Result<()> {
    if args.json {
        let rows: Vec<_> = outcomes
            .iter()
            .map(|(step, outcome)| {
                serde_json::json!({
                    "step": step.index(),
                    "label": step.label(),
                    "outcome": outcome,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(rows))?;
    } else {
        for (step, outcome) in outcomes {
            print(text_output::outcome_line(*step, outcome));
        }
    }
    let failed = outcomes.iter().filter(|(_, o)| !o.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} step(s) did not succeed", outcomes.len());
    }
    Ok(())
}

/// Read subtitle content from `path`, or stdin when none is given.
async fn read_content(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("read {}", p.display())),
        None => tokio::task::spawn_blocking(|| -> Result<String> {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        })
        .await
        .context("stdin reader failed")?,
    }
}

fn confirm(question: &str) -> Result<bool> {
    let mut err = std::io::stderr();
    write!(err, "{question} [y/N] ")?;
    err.flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_expectations() {
        let args = Cli::parse_from(["karaoke-dash", "--text"]);
        let cfg = build_config(&args);
        assert_eq!(cfg.base_url, "http://localhost:5001");
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.wait_timeout, Duration::from_secs(300));
        assert_eq!(cfg.wait_interval, Duration::from_secs(1));
        assert_eq!(cfg.step_delay, Duration::from_secs(1));
        assert_eq!(cfg.video_file, DEFAULT_VIDEO_FILE);
        assert!(!args.is_interactive());
    }

    #[test]
    fn global_inputs_apply_to_subcommands() {
        let args = Cli::parse_from([
            "karaoke-dash",
            "run",
            "cut",
            "--start",
            "0:10",
            "--end",
            "0:40",
        ]);
        assert!(matches!(args.command, Some(Command::Run { step: Step::Cut })));
        let req = step_inputs(&args).resolve();
        assert_eq!(req.start_time, "0:10");
        assert_eq!(req.end_time, "0:40");
    }

    #[test]
    fn languages_and_steps_parse_from_arguments() {
        let args = Cli::parse_from(["karaoke-dash", "file", "save", "ar", "--input", "x.srt"]);
        match args.command {
            Some(Command::File(FileCommand::Save { lang, input })) => {
                assert_eq!(lang, SubtitleLang::Arabic);
                assert_eq!(input, Some(PathBuf::from("x.srt")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["karaoke-dash", "run", "9"]).is_err());
    }
}
