// Folder Resizer: shrink every image in a folder into *_red copies
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use folder_resizer::batch::{panic_message, resize_file};
use folder_resizer::{
    BatchRun, DialogGate, FileOutcome, FormState, Notice, NoticeLevel, ResizeError, RunConfiguration, RunError,
};
use iced::font::{Family, Weight};
use iced::widget::{button, checkbox, column, container, progress_bar, row, scrollable, text, text_input, Space};
use iced::{executor, Application, Command, Element, Font, Length, Settings, Theme};
use std::path::PathBuf;
use tracing::info;

const HEADING_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Bold,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const BODY_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Normal,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

pub fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    FolderResizer::run(Settings {
        window: iced::window::Settings {
            size: (520, 560),
            min_size: Some((480, 480)),
            resizable: true,
            decorations: true,
            ..Default::default()
        },
        default_font: BODY_FONT,
        default_text_size: 14.0,
        ..Default::default()
    })
}

struct FolderResizer {
    form: FormState,
    active: Option<ActiveRun>,
    dialogs: DialogGate,
}

/// A run in progress: one file is handed to a blocking worker at a time.
struct ActiveRun {
    config: RunConfiguration,
    batch: BatchRun,
}

#[derive(Debug, Clone)]
enum Message {
    BrowseFolder,
    FolderPicked(Option<PathBuf>),
    FolderChanged(String),
    WidthChanged(String),
    HeightChanged(String),
    PreserveAspectToggled(bool),
    Run,
    FileProcessed(Result<FileOutcome, String>),
    Clear,
    NoticeClosed,
}

impl Message {
    fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::BrowseFolder
                | Self::FolderChanged(_)
                | Self::WidthChanged(_)
                | Self::HeightChanged(_)
                | Self::PreserveAspectToggled(_)
                | Self::Run
                | Self::Clear
        )
    }
}

impl Application for FolderResizer {
    type Message = Message;
    type Theme = Theme;
    type Executor = executor::Default;
    type Flags = ();

    fn new(_flags: ()) -> (Self, Command<Message>) {
        let app = Self {
            form: FormState::default(),
            active: None,
            dialogs: DialogGate::default(),
        };
        (app, Command::none())
    }

    fn title(&self) -> String {
        String::from("Folder Resizer")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        // The form stays modal while a dialog is up
        if self.dialogs.is_blocking() && message.is_user_input() {
            return Command::none();
        }

        match message {
            Message::BrowseFolder => {
                return Command::perform(select_folder(), Message::FolderPicked);
            }
            Message::FolderPicked(picked) => {
                self.form.select_folder(picked);
                return snap_log_to_end();
            }
            Message::FolderChanged(value) => {
                self.form.folder = value;
            }
            Message::WidthChanged(value) => {
                self.form.width = value;
            }
            Message::HeightChanged(value) => {
                self.form.height = value;
            }
            Message::PreserveAspectToggled(value) => {
                self.form.preserve_aspect_ratio = value;
            }
            Message::Run => {
                if self.active.is_some() {
                    return Command::none();
                }
                match self.form.prepare_run() {
                    Ok(plan) => {
                        let (batch, started) = BatchRun::start(plan.files);
                        self.form.apply(&started);
                        self.active = Some(ActiveRun {
                            config: plan.config,
                            batch,
                        });
                        return Command::batch(vec![self.process_next(), snap_log_to_end()]);
                    }
                    Err(notice) => {
                        return Command::batch(vec![self.show_notice(notice), snap_log_to_end()]);
                    }
                }
            }
            Message::FileProcessed(Ok(outcome)) => {
                let Some(active) = self.active.as_mut() else {
                    return Command::none();
                };
                let event = active.batch.record(outcome);
                self.form.apply(&event);

                if !active.batch.is_finished() {
                    return Command::batch(vec![self.process_next(), snap_log_to_end()]);
                }
                if let Some(finished) = self.active.take() {
                    let result = finished.batch.finish();
                    let notice = self.form.finish_run(&result);
                    return Command::batch(vec![self.show_notice(notice), snap_log_to_end()]);
                }
            }
            Message::FileProcessed(Err(reason)) => {
                // Only a cancelled worker ends up here; panics are per-file failures
                self.active = None;
                let notice = self.form.abort_run(RunError::Worker(reason));
                return Command::batch(vec![self.show_notice(notice), snap_log_to_end()]);
            }
            Message::Clear => {
                self.form.clear();
            }
            Message::NoticeClosed => {
                self.dialogs.close();
            }
        }
        Command::none()
    }

    fn view(&self) -> Element<Message> {
        let is_running = self.active.is_some();
        let locked = is_running || self.dialogs.is_blocking();

        let title = text("Folder Resizer")
            .size(22)
            .font(HEADING_FONT);

        // Folder selection
        let folder_selection = column![
            text("Image Folder")
                .size(16)
                .font(HEADING_FONT),
            row![
                text_input("Folder path", &self.form.folder)
                    .on_input(Message::FolderChanged)
                    .width(Length::Fill)
                    .padding(4)
                    .size(13),
                button("Browse")
                    .on_press(Message::BrowseFolder)
                    .padding([6, 12]),
            ].spacing(8),
        ].spacing(8);

        // Output size
        let parameters = column![
            text("Output Size")
                .size(16)
                .font(HEADING_FONT),
            row![
                text("Width (px):")
                    .size(13)
                    .font(BODY_FONT),
                text_input("1024", &self.form.width)
                    .on_input(Message::WidthChanged)
                    .width(Length::Fixed(70.0))
                    .padding(4)
                    .size(13),
                Space::with_width(12),
                text("Height (px):")
                    .size(13)
                    .font(BODY_FONT),
                text_input("1024", &self.form.height)
                    .on_input(Message::HeightChanged)
                    .width(Length::Fixed(70.0))
                    .padding(4)
                    .size(13),
            ].spacing(6),
            checkbox("Preserve aspect ratio", self.form.preserve_aspect_ratio, Message::PreserveAspectToggled)
                .size(13)
                .spacing(8),
        ].spacing(8);

        // Actions are locked while a run is in progress or a dialog is open
        let run_button = if is_running {
            button("Resizing...")
                .padding([8, 16])
        } else if locked {
            button("Resize Images")
                .padding([8, 16])
        } else {
            button("Resize Images")
                .on_press(Message::Run)
                .padding([8, 16])
        };
        let clear_button = if locked {
            button("Clear")
                .padding([8, 16])
        } else {
            button("Clear")
                .on_press(Message::Clear)
                .padding([8, 16])
        };

        let progress = progress_bar(0.0..=100.0, self.form.progress())
            .height(Length::Fixed(8.0));

        // Log
        let lines: Vec<Element<Message>> = self.form.log().iter().map(|line| {
            text(line)
                .size(12)
                .font(BODY_FONT)
                .into()
        }).collect();

        let log_section = column![
            text("Log")
                .size(16)
                .font(HEADING_FONT),
            container(
                scrollable(
                    column(lines).spacing(2).width(Length::Fill)
                )
                .id(log_id())
                .height(Length::Fill)
            )
            .style(iced::theme::Container::Box)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(8),
        ].spacing(8);

        let content = column![
            title,
            Space::with_height(12),
            folder_selection,
            Space::with_height(12),
            parameters,
            Space::with_height(12),
            row![run_button, clear_button].spacing(8),
            Space::with_height(12),
            progress,
            Space::with_height(12),
            log_section,
        ]
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}

impl FolderResizer {
    /// Presents `notice` and keeps the form locked until it is dismissed.
    fn show_notice(&mut self, notice: Notice) -> Command<Message> {
        info!(title = %notice.title, body = %notice.body, "showing dialog");
        let notice = self.dialogs.open(notice);
        Command::perform(present_notice(notice), |_| Message::NoticeClosed)
    }

    /// Hands the next pending file to a blocking worker.
    fn process_next(&self) -> Command<Message> {
        let Some(active) = &self.active else {
            return Command::none();
        };
        match active.batch.next_file() {
            Some(path) => Command::perform(
                process_file(path.to_path_buf(), active.config.clone()),
                Message::FileProcessed,
            ),
            None => Command::none(),
        }
    }
}

// Helper functions
async fn select_folder() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Select image folder")
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}

async fn process_file(path: PathBuf, config: RunConfiguration) -> Result<FileOutcome, String> {
    let input = path.clone();
    match tokio::task::spawn_blocking(move || resize_file(&path, &config)).await {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_panic() => {
            let reason = panic_message(e.into_panic().as_ref());
            Ok(FileOutcome::from_result(&input, Err(ResizeError::Panicked(reason))))
        }
        Err(e) => Err(e.to_string()),
    }
}

async fn present_notice(notice: Notice) {
    let level = match notice.level {
        NoticeLevel::Info => rfd::MessageLevel::Info,
        NoticeLevel::Warning => rfd::MessageLevel::Warning,
        NoticeLevel::Error => rfd::MessageLevel::Error,
    };
    rfd::AsyncMessageDialog::new()
        .set_level(level)
        .set_title(notice.title.as_str())
        .set_description(notice.body.as_str())
        .set_buttons(rfd::MessageButtons::Ok)
        .show()
        .await;
}

fn log_id() -> scrollable::Id {
    scrollable::Id::new("log")
}

fn snap_log_to_end() -> Command<Message> {
    scrollable::snap_to(log_id(), scrollable::RelativeOffset { x: 0.0, y: 1.0 })
}
