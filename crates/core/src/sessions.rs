//! Session data access.
//!
//! The panel never fetches sessions itself; it asks a [`SessionSource`]. Two sources exist:
//!
//! - [`MockSessionSource`] returns three fixed sessions for any patient and is the default when no
//!   session directory is configured.
//! - [`YamlSessionSource`] reads `<sessions_dir>/<patient_id>/sessions.yaml`.
//!
//! ## Storage Layout
//!
//! ```text
//! sessions/
//!   <patient_id>/
//!     sessions.yaml    # list of { id, date, transcription }
//! ```

use crate::constants::SESSIONS_FILENAME;
use crate::error::{StoryError, StoryResult};
use crate::story::Session;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tales_types::PatientId;

/// Read-only access to a patient's recorded sessions.
pub trait SessionSource: Send + Sync {
    /// Lists the sessions of `patient_id` in the order they should be displayed.
    fn list_sessions(&self, patient_id: &PatientId) -> StoryResult<Vec<Session>>;
}

/// Fixed in-memory sessions stamped with whichever patient is asked for.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockSessionSource;

impl MockSessionSource {
    pub fn new() -> Self {
        Self
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .unwrap_or_default()
    }
}

impl SessionSource for MockSessionSource {
    fn list_sessions(&self, patient_id: &PatientId) -> StoryResult<Vec<Session>> {
        let fixtures = [
            ("1", Self::at(2023, 3, 15, 14, 30), "Première séance avec le patient."),
            (
                "2",
                Self::at(2023, 4, 2, 10, 15),
                "Discussion sur les relations familiales.",
            ),
            (
                "3",
                Self::at(2023, 5, 10, 11, 0),
                "Exploration des problèmes d'anxiété.",
            ),
        ];

        Ok(fixtures
            .into_iter()
            .map(|(id, date, transcription)| Session {
                id: id.to_string(),
                patient_id: patient_id.clone(),
                date,
                transcription: transcription.to_string(),
            })
            .collect())
    }
}

/// Sessions stored as YAML files, one directory per patient.
#[derive(Clone, Debug)]
pub struct YamlSessionSource {
    sessions_dir: PathBuf,
}

#[derive(Deserialize)]
struct StoredSession {
    id: String,
    date: DateTime<Utc>,
    #[serde(default)]
    transcription: String,
}

impl YamlSessionSource {
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    fn sessions_file(&self, patient_id: &PatientId) -> PathBuf {
        self.sessions_dir
            .join(patient_id.as_str())
            .join(SESSIONS_FILENAME)
    }
}

impl SessionSource for YamlSessionSource {
    fn list_sessions(&self, patient_id: &PatientId) -> StoryResult<Vec<Session>> {
        let path = self.sessions_file(patient_id);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no sessions file for patient {}: {}", patient_id, path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoryError::SessionRead(e)),
        };

        // An empty file deserialises as unit, not as an empty list.
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let stored: Vec<StoredSession> =
            serde_yaml::from_str(&contents).map_err(StoryError::SessionParse)?;

        Ok(stored
            .into_iter()
            .map(|s| Session {
                id: s.id,
                patient_id: patient_id.clone(),
                date: s.date,
                transcription: s.transcription,
            })
            .collect())
    }
}
