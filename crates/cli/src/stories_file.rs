//! The CLI's story list, kept as a YAML file.
//!
//! The panel never mutates a story list; this file is the list's owner on the command line.

use std::error::Error;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tales_core::Story;

/// Reads the story list. A missing or empty file is an empty list.
pub fn load_stories(path: &Path) -> Result<Vec<Story>, Box<dyn Error>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(format!("failed to read {}: {}", path.display(), e).into()),
    };

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str(&contents)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e).into())
}

pub fn save_stories(path: &Path, stories: &[Story]) -> Result<(), Box<dyn Error>> {
    let raw = serde_yaml::to_string(stories)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, raw)?;
    Ok(())
}

pub fn find_story<'a>(stories: &'a [Story], story_id: &str) -> Result<&'a Story, Box<dyn Error>> {
    stories
        .iter()
        .find(|s| s.id.as_str() == story_id)
        .ok_or_else(|| format!("no story with id '{story_id}'").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tales_core::{PatientId, StoryId, StoryKind};
    use tempfile::TempDir;

    fn story(id: &str) -> Story {
        Story {
            id: StoryId::from(id),
            patient_id: PatientId::parse("p1").unwrap(),
            title: format!("Conte {id}"),
            kind: StoryKind::Therapeutic,
            content: "Il était une fois".into(),
            created_at: Utc.with_ymd_and_hms(2023, 5, 10, 11, 0, 0).unwrap(),
            pages: vec!["Il était une fois".into()],
        }
    }

    #[test]
    fn missing_file_is_empty_list() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let stories = load_stories(&temp_dir.path().join("stories.yaml")).unwrap();
        assert!(stories.is_empty());
    }

    #[test]
    fn saved_stories_load_back_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("stories.yaml");

        save_stories(&path, &[story("a"), story("b")]).expect("save should succeed");
        let loaded = load_stories(&path).expect("load should succeed");

        assert_eq!(loaded, vec![story("a"), story("b")]);
    }

    #[test]
    fn find_story_reports_unknown_id() {
        let stories = [story("a")];
        assert_eq!(find_story(&stories, "a").unwrap().title, "Conte a");
        assert!(find_story(&stories, "zz").is_err());
    }
}
