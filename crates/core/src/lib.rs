//! # Tales Core
//!
//! Business logic for the patient "story tab": therapeutic stories generated for a patient,
//! optionally grounded in a selection of the patient's session transcripts.
//!
//! This crate contains:
//! - the [`Story`] and [`Session`] records,
//! - [`SessionSource`] implementations (mock and YAML-backed),
//! - the [`StoryGenerator`] abstraction and its simulated implementation,
//! - plain-text export,
//! - the [`StoryPanel`] view-model that owns the tab's UI state.
//!
//! **No API concerns**: HTTP handlers and the CLI live in `api-rest` and `tales-cli`.

pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod export;
pub mod generation;
pub mod panel;
pub mod sessions;
pub mod story;
pub mod views;

pub use config::CoreConfig;
pub use error::{GenerationError, StoryError, StoryResult};
pub use export::{
    export_story, DirectoryExportSink, ExportSink, ExportedFile, MemoryExportSink,
};
pub use generation::{
    run_generation, GenerationRequest, GenerationTicket, SimulatedGenerator, StoryGenerator,
};
pub use panel::{FormDraft, FormField, StoryPanel};
pub use sessions::{MockSessionSource, SessionSource, YamlSessionSource};
pub use story::{Session, Story, StoryKind};
pub use views::{
    CreationView, Notification, NotificationLevel, SessionRow, StoryListCard, StoryListView,
    StoryRow, ViewerView,
};

pub use tales_types::{PatientId, StoryId, StoryTitle, TextError};

/// Builds the session source selected by `cfg`.
pub fn session_source(cfg: &CoreConfig) -> Box<dyn SessionSource> {
    match cfg.sessions_dir() {
        Some(dir) => Box::new(YamlSessionSource::new(dir)),
        None => Box::new(MockSessionSource::new()),
    }
}
