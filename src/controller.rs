//! Form state behind the window, independent of any widget toolkit.

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::batch::{run_batch, ProgressEvent, RunResult};
use crate::config::{RunConfiguration, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::discovery::discover_image_files;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A dialog the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: &str, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.to_string(),
            body: body.into(),
        }
    }
}

/// Tracks dialogs still waiting for acknowledgement. While any is open the
/// form does not accept edits or start a run.
#[derive(Debug, Default)]
pub struct DialogGate {
    open: usize,
}

impl DialogGate {
    pub fn open(&mut self, notice: Notice) -> Notice {
        self.open += 1;
        notice
    }

    pub fn close(&mut self) {
        self.open = self.open.saturating_sub(1);
    }

    pub fn is_blocking(&self) -> bool {
        self.open > 0
    }
}

/// Everything a run needs once input has been validated.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub config: RunConfiguration,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub folder: String,
    pub width: String,
    pub height: String,
    pub preserve_aspect_ratio: bool,
    log: Vec<String>,
    progress: f32,
}

impl Default for FormState {
    fn default() -> Self {
        let folder = std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        Self::with_folder(folder)
    }
}

impl FormState {
    pub fn with_folder(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            width: DEFAULT_WIDTH.to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            preserve_aspect_ratio: true,
            log: Vec::new(),
            progress: 0.0,
        }
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Progress bar value, 0 to 100.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Applies the result of the folder picker. `None` means the user cancelled.
    pub fn select_folder(&mut self, picked: Option<PathBuf>) {
        if let Some(folder) = picked {
            self.folder = folder.display().to_string();
            self.push_log(format!("Folder selected: {}", self.folder));
        }
    }

    /// Validates the form and finds the images to process.
    ///
    /// On `Err` the returned notice must be shown; the form is left untouched
    /// unless the folder could not be read at all.
    pub fn prepare_run(&mut self) -> Result<RunPlan, Notice> {
        let config = RunConfiguration::from_input(
            &self.folder,
            &self.width,
            &self.height,
            self.preserve_aspect_ratio,
        )
        .map_err(|e| {
            warn!(error = %e, "invalid configuration");
            Notice::new(NoticeLevel::Error, "Error", e.to_string())
        })?;

        let files = match discover_image_files(&config.folder) {
            Ok(files) => files,
            Err(e) => return Err(self.abort_run(e)),
        };

        if files.is_empty() {
            info!(folder = %config.folder.display(), "no images found");
            return Err(Notice::new(
                NoticeLevel::Warning,
                "Warning",
                "No image files were found in the selected folder.",
            ));
        }

        Ok(RunPlan { config, files })
    }

    pub fn apply(&mut self, event: &ProgressEvent) {
        self.push_log(event.message.clone());
        self.progress = event.percent();
    }

    /// Closes a completed run and returns its summary dialog.
    pub fn finish_run(&mut self, result: &RunResult) -> Notice {
        let notice = if result.errors == 0 {
            Notice::new(
                NoticeLevel::Info,
                "Done",
                format!(
                    "All images were processed.\nProcessed: {}",
                    result.processed
                ),
            )
        } else {
            Notice::new(
                NoticeLevel::Warning,
                "Done",
                format!(
                    "Processing finished.\nProcessed: {}\nErrors: {}",
                    result.processed, result.errors
                ),
            )
        };
        self.push_log("Done.".to_string());
        notice
    }

    /// Records an unexpected failure. Files already written stay on disk.
    pub fn abort_run(&mut self, cause: impl fmt::Display) -> Notice {
        error!(error = %cause, "run aborted");
        self.push_log(format!("error: {}", cause));
        Notice::new(
            NoticeLevel::Error,
            "Error",
            format!("An unexpected error occurred: {}", cause),
        )
    }

    /// Runs the whole workflow on the calling thread and returns the dialog
    /// to show at the end.
    pub fn run(&mut self) -> Notice {
        let plan = match self.prepare_run() {
            Ok(plan) => plan,
            Err(notice) => return notice,
        };
        let result = run_batch(plan.files, &plan.config, |event| self.apply(event));
        self.finish_run(&result)
    }

    /// Empties the log and resets progress. Input fields are kept.
    pub fn clear(&mut self) {
        self.log.clear();
        self.progress = 0.0;
    }

    fn push_log(&mut self, line: String) {
        self.log.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use std::fs;
    use std::path::Path;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn defaults_match_the_form() {
        let form = FormState::with_folder("/tmp");
        assert_eq!(form.width, "1024");
        assert_eq!(form.height, "1024");
        assert!(form.preserve_aspect_ratio);
        assert!(form.log().is_empty());
        assert_eq!(form.progress(), 0.0);
    }

    #[test]
    fn cancelled_picker_changes_nothing() {
        let mut form = FormState::with_folder("/tmp");
        form.select_folder(None);
        assert_eq!(form.folder, "/tmp");
        assert!(form.log().is_empty());

        form.select_folder(Some(PathBuf::from("/data/photos")));
        assert_eq!(form.folder, "/data/photos");
        assert_eq!(form.log(), ["Folder selected: /data/photos"]);
    }

    #[test]
    fn invalid_width_aborts_without_touching_state() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 4, 4);
        let mut form = FormState::with_folder(dir.path().display().to_string());
        form.width = "abc".to_string();
        let before = form.clone();

        let notice = form.prepare_run().unwrap_err();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.body.contains("width"));
        assert_eq!(form, before);
        assert!(!dir.path().join("a_red.png").exists());
    }

    #[test]
    fn empty_folder_warns_and_keeps_log() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        let mut form = FormState::with_folder(dir.path().display().to_string());

        let notice = form.run();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(form.log().is_empty());
        assert_eq!(form.progress(), 0.0);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let mut form = FormState::with_folder("");
        let notice = form.run();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.body, "Please choose a valid folder.");
    }

    #[test]
    fn successful_run_logs_every_step() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 20, 10);
        write_png(&dir.path().join("b.png"), 5, 5);
        let mut form = FormState::with_folder(dir.path().display().to_string());
        form.width = "10".to_string();
        form.height = "10".to_string();

        let notice = form.run();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(form.progress(), 100.0);
        assert_eq!(
            form.log(),
            [
                "Started: found 2 image files",
                "a.png → a_red.png",
                "b.png → b_red.png",
                "Done.",
            ]
        );
    }

    #[test]
    fn clear_keeps_inputs() {
        let mut form = FormState::with_folder("/tmp");
        form.width = "640".to_string();
        form.select_folder(Some(PathBuf::from("/srv")));
        form.apply(&ProgressEvent {
            file_index: Some(0),
            total: 2,
            message: "x".to_string(),
        });
        assert_eq!(form.progress(), 50.0);

        form.clear();
        assert!(form.log().is_empty());
        assert_eq!(form.progress(), 0.0);
        assert_eq!(form.folder, "/srv");
        assert_eq!(form.width, "640");
    }

    #[test]
    fn gate_blocks_until_every_dialog_is_closed() {
        let mut gate = DialogGate::default();
        assert!(!gate.is_blocking());

        let notice = Notice::new(NoticeLevel::Error, "Error", "bad width");
        let shown = gate.open(notice.clone());
        assert_eq!(shown, notice);
        gate.open(notice);
        assert!(gate.is_blocking());

        gate.close();
        assert!(gate.is_blocking());
        gate.close();
        assert!(!gate.is_blocking());
        gate.close();
        assert!(!gate.is_blocking());
    }

    #[test]
    fn abort_logs_the_cause() {
        let mut form = FormState::with_folder("/tmp");
        let notice = form.abort_run(RunError::Worker("panicked".to_string()));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(form.log(), ["error: background worker failed: panicked"]);
    }
}
