//! Story and session records.
//!
//! Both are value objects owned by an outer data layer; the panel only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tales_types::{PatientId, StoryId};

/// Type tag of a story.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryKind {
    #[default]
    Therapeutic,
}

/// A generated narrative for a patient, split into pages for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub patient_id: PatientId,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: StoryKind,
    /// Full text body.
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Paginated excerpts of the body, in reading order.
    #[serde(default)]
    pub pages: Vec<String>,
}

impl Story {
    /// Number of pages shown to the reader. A story without pages still displays as one page.
    pub fn display_page_count(&self) -> usize {
        self.pages.len().max(1)
    }

    /// Index of the last page a reader can navigate to.
    pub fn last_page_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }
}

/// A recorded and transcribed therapy session, usable as generation context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub patient_id: PatientId,
    pub date: DateTime<Utc>,
    pub transcription: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn story_with_pages(pages: &[&str]) -> Story {
        Story {
            id: StoryId::from("s1"),
            patient_id: PatientId::parse("p1").unwrap(),
            title: "Le renard".into(),
            kind: StoryKind::Therapeutic,
            content: pages.join(" "),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn pageless_story_displays_as_single_page() {
        let story = story_with_pages(&[]);
        assert_eq!(story.display_page_count(), 1);
        assert_eq!(story.last_page_index(), 0);
        assert_eq!(story.page(0), None);
    }

    #[test]
    fn page_lookup_is_bounds_checked() {
        let story = story_with_pages(&["A", "B"]);
        assert_eq!(story.display_page_count(), 2);
        assert_eq!(story.last_page_index(), 1);
        assert_eq!(story.page(1), Some("B"));
        assert_eq!(story.page(2), None);
    }

    #[test]
    fn story_yaml_uses_type_tag_and_defaults_pages() {
        let yaml = "id: '42'\npatient_id: p1\ntitle: Léo\ntype: therapeutic\ncontent: Il était une fois\ncreated_at: 2023-03-15T14:30:00Z\n";
        let story: Story = serde_yaml::from_str(yaml).expect("story should parse");
        assert_eq!(story.id.as_str(), "42");
        assert_eq!(story.kind, StoryKind::Therapeutic);
        assert!(story.pages.is_empty());
    }
}
