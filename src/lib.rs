//! Batch-resize the images of a folder, writing `<name>_red.<ext>` copies
//! next to the originals.

pub mod batch;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod resize;

pub use batch::{run_batch, BatchRun, FileOutcome, ProgressEvent, RunResult};
pub use config::{RunConfiguration, SaveOptions};
pub use controller::{DialogGate, FormState, Notice, NoticeLevel, RunPlan};
pub use discovery::discover_image_files;
pub use error::{ConfigError, Dimension, ResizeError, RunError};
pub use resize::{fit_within, process_one};
