//! Sequential batch processing with per-file failure isolation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::RunConfiguration;
use crate::error::ResizeError;
use crate::resize::process_one;

/// Progress notification emitted once at the start of a run and once per file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Zero-based index of the file just attempted; `None` for the start event.
    pub file_index: Option<usize>,
    pub total: usize,
    pub message: String,
}

impl ProgressEvent {
    /// Completion in percent, 0 to 100.
    pub fn percent(&self) -> f32 {
        match self.file_index {
            Some(index) if self.total > 0 => (index + 1) as f32 / self.total as f32 * 100.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Resized { input: String, output: String },
    Failed { input: String, reason: String },
}

impl FileOutcome {
    pub fn from_result(image_path: &Path, result: Result<PathBuf, ResizeError>) -> Self {
        let input = file_name(image_path);
        match result {
            Ok(output) => Self::Resized {
                input,
                output: file_name(&output),
            },
            Err(e) => Self::Failed {
                input,
                reason: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Resized { .. })
    }

    pub fn log_line(&self) -> String {
        match self {
            Self::Resized { input, output } => format!("{} → {}", input, output),
            Self::Failed { input, reason } => format!("error: {} - {}", input, reason),
        }
    }
}

/// Resizes a single file and folds the result into a [`FileOutcome`].
pub fn resize_file(image_path: &Path, config: &RunConfiguration) -> FileOutcome {
    attempt(image_path, || process_one(image_path, config))
}

/// Runs `process` for one file. A panic inside a codec becomes a
/// [`ResizeError::Panicked`] failure for that file only.
pub fn attempt(
    image_path: &Path,
    process: impl FnOnce() -> Result<PathBuf, ResizeError>,
) -> FileOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(process))
        .unwrap_or_else(|payload| Err(ResizeError::Panicked(panic_message(payload.as_ref()))));
    FileOutcome::from_result(image_path, result)
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Aggregate counts and log of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub processed: usize,
    pub errors: usize,
    /// Start message followed by one line per file.
    pub log: Vec<String>,
}

impl RunResult {
    pub fn total(&self) -> usize {
        self.processed + self.errors
    }
}

/// Incremental form of [`run_batch`]: the caller attempts
/// [`next_file`](Self::next_file) and hands the outcome to
/// [`record`](Self::record) until [`is_finished`](Self::is_finished).
#[derive(Debug)]
pub struct BatchRun {
    files: Vec<PathBuf>,
    next: usize,
    result: RunResult,
}

impl BatchRun {
    pub fn start(files: Vec<PathBuf>) -> (Self, ProgressEvent) {
        let total = files.len();
        let message = format!("Started: found {} image files", total);
        info!(total, "batch started");

        let mut result = RunResult::default();
        result.log.push(message.clone());

        let run = Self {
            files,
            next: 0,
            result,
        };
        let event = ProgressEvent {
            file_index: None,
            total,
            message,
        };
        (run, event)
    }

    pub fn next_file(&self) -> Option<&Path> {
        self.files.get(self.next).map(PathBuf::as_path)
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.files.len()
    }

    /// Records the outcome for the current file and advances to the next.
    pub fn record(&mut self, outcome: FileOutcome) -> ProgressEvent {
        let index = self.next;
        match &outcome {
            FileOutcome::Resized { input, output } => {
                self.result.processed += 1;
                debug!(index, %input, %output, "resized");
            }
            FileOutcome::Failed { input, reason } => {
                self.result.errors += 1;
                warn!(index, %input, %reason, "resize failed");
            }
        }

        let message = outcome.log_line();
        self.result.log.push(message.clone());
        self.next += 1;

        ProgressEvent {
            file_index: Some(index),
            total: self.files.len(),
            message,
        }
    }

    pub fn finish(self) -> RunResult {
        info!(
            processed = self.result.processed,
            errors = self.result.errors,
            "batch finished"
        );
        self.result
    }
}

/// Resizes every file in order, reporting each step to `on_event`.
///
/// Per-file failures are counted and logged; they never stop the batch.
pub fn run_batch(
    files: Vec<PathBuf>,
    config: &RunConfiguration,
    on_event: impl FnMut(&ProgressEvent),
) -> RunResult {
    run_batch_with(files, on_event, |path| process_one(path, config))
}

/// [`run_batch`] with a caller-supplied per-file step in place of
/// [`process_one`].
pub fn run_batch_with(
    files: Vec<PathBuf>,
    mut on_event: impl FnMut(&ProgressEvent),
    mut process: impl FnMut(&Path) -> Result<PathBuf, ResizeError>,
) -> RunResult {
    let (mut run, started) = BatchRun::start(files);
    on_event(&started);

    while let Some(path) = run.next_file().map(Path::to_path_buf) {
        let outcome = attempt(&path, || process(&path));
        let event = run.record(outcome);
        on_event(&event);
    }

    run.finish()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}
