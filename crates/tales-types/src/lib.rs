//! # Tales Types
//!
//! Validated value types shared by the story panel crates.
//!
//! Everything that crosses a crate boundary as "some string that must be valid" lives here so the
//! check happens exactly once, at construction.

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty
    #[error("Text cannot be empty")]
    Empty,
    /// The patient identifier cannot be used as a single path segment
    #[error("invalid patient id: {0}")]
    InvalidPatientId(String),
}

/// Title of a story, kept exactly as the clinician typed it.
///
/// The only requirement is that the title is not the empty string. Surrounding whitespace is part
/// of the title and shows up in the exported file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoryTitle(String);

impl StoryTitle {
    /// Wraps `input` without altering it.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is the empty string.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StoryTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StoryTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for StoryTitle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for StoryTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StoryTitle::new(s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of the patient that owns stories and sessions.
///
/// Patient identifiers come from the surrounding record system and are otherwise opaque. They are
/// also used as a directory name by file-backed session sources, so anything that is not a single
/// safe path segment is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientId(String);

impl PatientId {
    /// Validates and wraps a patient identifier.
    ///
    /// # Errors
    ///
    /// - [`TextError::Empty`] if the trimmed input is empty.
    /// - [`TextError::InvalidPatientId`] if it contains path separators or control characters, or
    ///   is `.`/`..`.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        let unsafe_segment = trimmed == "."
            || trimmed == ".."
            || trimmed
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control());
        if unsafe_segment {
            return Err(TextError::InvalidPatientId(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PatientId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatientId::parse(s)
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a story.
///
/// Stories supplied by an external data layer may carry any identifier, so parsing only requires
/// the value to be non-empty. Freshly generated stories get a canonical UUID
/// (32 lowercase hex characters, no hyphens).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    /// Allocates a new random story identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoryId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_title_keeps_text_as_typed() {
        let title = StoryTitle::new("  Le renard ").expect("padded title is valid");
        assert_eq!(title.as_str(), "  Le renard ");
        assert_eq!(StoryTitle::new("   ").unwrap().into_inner(), "   ");
    }

    #[test]
    fn story_title_rejects_only_empty_string() {
        assert_eq!(StoryTitle::new(""), Err(TextError::Empty));
        let result: Result<StoryTitle, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn patient_id_accepts_opaque_identifiers() {
        let id = PatientId::parse("patient-42").expect("plain id should parse");
        assert_eq!(id.as_str(), "patient-42");
        assert_eq!(id.to_string(), "patient-42");
    }

    #[test]
    fn patient_id_rejects_path_traversal() {
        for bad in ["..", ".", "a/b", "a\\b", "a\0b"] {
            assert!(
                matches!(PatientId::parse(bad), Err(TextError::InvalidPatientId(_))),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(PatientId::parse("  "), Err(TextError::Empty));
    }

    #[test]
    fn generated_story_ids_are_canonical_and_unique() {
        let a = StoryId::generate();
        let b = StoryId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a
            .as_str()
            .bytes()
            .all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn story_id_serializes_as_plain_string() {
        let id = StoryId::from("1712345678901");
        assert_eq!(
            serde_json::to_string(&id).expect("serialize"),
            "\"1712345678901\""
        );
    }
}
