//! Plain-text story export.
//!
//! An export is built in two steps: [`export_story`] renders the artifact, then an [`ExportSink`]
//! delivers it (the equivalent of a browser download).

use crate::constants::{EXPORT_EXTENSION, EXPORT_MEDIA_TYPE, EXPORT_PAGE_SEPARATOR};
use crate::error::{StoryError, StoryResult};
use crate::story::Story;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// A rendered export, ready to be delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub media_type: &'static str,
    pub contents: String,
}

fn whitespace_runs() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static pattern is valid"))
}

/// Suggested file name for a story: whitespace runs become `_`, then `.txt` is appended.
///
/// No other characters are escaped.
pub fn export_file_name(title: &str) -> String {
    format!(
        "{}.{}",
        whitespace_runs().replace_all(title, "_"),
        EXPORT_EXTENSION
    )
}

/// Pages joined by a blank line.
pub fn export_contents(pages: &[String]) -> String {
    pages.join(EXPORT_PAGE_SEPARATOR)
}

pub fn export_story(story: &Story) -> ExportedFile {
    ExportedFile {
        file_name: export_file_name(&story.title),
        media_type: EXPORT_MEDIA_TYPE,
        contents: export_contents(&story.pages),
    }
}

/// Destination of exported files.
pub trait ExportSink {
    fn deliver(&self, file: &ExportedFile) -> StoryResult<()>;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a file with `file_name` would be written to.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidInput`] unless `file_name` is a single plain path component,
    /// so a title such as `../x` cannot escape the export directory.
    pub fn target_path(&self, file_name: &str) -> StoryResult<PathBuf> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(file_name)),
            _ => Err(StoryError::InvalidInput(format!(
                "export file name is not a plain file name: '{file_name}'"
            ))),
        }
    }
}

impl ExportSink for DirectoryExportSink {
    fn deliver(&self, file: &ExportedFile) -> StoryResult<()> {
        let path = self.target_path(&file.file_name)?;
        fs::create_dir_all(&self.dir).map_err(StoryError::Export)?;
        fs::write(&path, file.contents.as_bytes()).map_err(StoryError::Export)?;
        tracing::info!("exported story to {}", path.display());
        Ok(())
    }
}

/// Keeps delivered exports in memory.
#[derive(Debug, Default)]
pub struct MemoryExportSink {
    files: Mutex<Vec<ExportedFile>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file delivered so far, oldest first.
    pub fn files(&self) -> Vec<ExportedFile> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ExportSink for MemoryExportSink {
    fn deliver(&self, file: &ExportedFile) -> StoryResult<()> {
        let mut files = self
            .files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        files.push(file.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::StoryKind;
    use chrono::Utc;
    use tales_types::{PatientId, StoryId};
    use tempfile::TempDir;

    fn story(title: &str, pages: &[&str]) -> Story {
        Story {
            id: StoryId::from("s1"),
            patient_id: PatientId::parse("p1").unwrap(),
            title: title.into(),
            kind: StoryKind::Therapeutic,
            content: String::new(),
            created_at: Utc::now(),
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn exports_pages_joined_by_blank_line() {
        let file = export_story(&story("My Tale", &["A", "B"]));
        assert_eq!(file.contents, "A\n\nB");
        assert_eq!(file.file_name, "My_Tale.txt");
        assert_eq!(file.media_type, "text/plain;charset=utf-8");
    }

    #[test]
    fn whitespace_runs_collapse_to_single_underscore() {
        assert_eq!(export_file_name("Le  petit\trenard\n"), "Le_petit_renard_.txt");
        assert_eq!(export_file_name(" Léo"), "_Léo.txt");
    }

    #[test]
    fn other_characters_are_left_alone() {
        assert_eq!(export_file_name("Léo: l'ami?"), "Léo:_l'ami?.txt");
    }

    #[test]
    fn pageless_story_exports_empty_text() {
        assert_eq!(export_story(&story("Vide", &[])).contents, "");
    }

    #[test]
    fn directory_sink_writes_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sink = DirectoryExportSink::new(temp_dir.path().join("exports"));

        sink.deliver(&export_story(&story("My Tale", &["A", "B"])))
            .expect("export should succeed");

        let written = fs::read_to_string(temp_dir.path().join("exports").join("My_Tale.txt"))
            .expect("exported file should exist");
        assert_eq!(written, "A\n\nB");
    }

    #[test]
    fn directory_sink_rejects_names_escaping_the_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sink = DirectoryExportSink::new(temp_dir.path());

        let err = sink
            .deliver(&export_story(&story("../évasion", &["A"])))
            .expect_err("traversal should be rejected");
        assert!(matches!(err, StoryError::InvalidInput(_)));
    }

    #[test]
    fn memory_sink_keeps_delivery_order() {
        let sink = MemoryExportSink::new();
        sink.deliver(&export_story(&story("Un", &["1"]))).unwrap();
        sink.deliver(&export_story(&story("Deux", &["2"]))).unwrap();

        let names: Vec<String> = sink.files().into_iter().map(|f| f.file_name).collect();
        assert_eq!(names, ["Un.txt", "Deux.txt"]);
    }
}
