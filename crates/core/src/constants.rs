//! Constants used throughout the tales core crate.
//!
//! User-facing strings are French: the panel is shipped with a single fixed locale.

use std::time::Duration;

/// Default delay of the simulated story generator.
pub const DEFAULT_GENERATION_DELAY: Duration = Duration::from_millis(3_000);

/// Default directory for exported story files.
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Filename of a patient's session list inside a YAML session directory.
pub const SESSIONS_FILENAME: &str = "sessions.yaml";

/// Separator placed between pages in an exported story.
pub const EXPORT_PAGE_SEPARATOR: &str = "\n\n";

/// Extension of exported story files.
pub const EXPORT_EXTENSION: &str = "txt";

/// Media type of exported story files.
pub const EXPORT_MEDIA_TYPE: &str = "text/plain;charset=utf-8";

/// Number of transcription characters shown in a session preview.
pub const SESSION_PREVIEW_CHARS: usize = 50;

/// chrono format for the long French date (`15 mars 2023`).
pub const LONG_DATE_FORMAT: &str = "%-d %B %Y";

pub const MSG_TITLE_REQUIRED: &str = "Le titre est requis";
pub const MSG_GENERATION_SUCCEEDED: &str = "Conte thérapeutique généré avec succès";
pub const MSG_GENERATION_FAILED: &str = "La génération du conte a échoué";
pub const MSG_EXPORT_SUCCEEDED: &str = "Conte thérapeutique exporté";
pub const MSG_EXPORT_FAILED: &str = "L'export du conte a échoué";

pub const LABEL_PANEL_TITLE: &str = "Contes thérapeutiques";
pub const LABEL_PANEL_DESCRIPTION: &str = "Histoires générées pour ce patient";
pub const LABEL_CREATE: &str = "Créer un conte";
pub const LABEL_CREATE_FIRST: &str = "Créer votre premier conte";
pub const LABEL_EMPTY_LIST: &str =
    "Aucun conte thérapeutique n'a encore été créé pour ce patient.";
pub const LABEL_VIEW: &str = "Voir";
pub const LABEL_EXPORT: &str = "Exporter";
pub const LABEL_NO_SESSIONS: &str = "Aucune séance disponible";
pub const LABEL_GENERATE: &str = "Générer le conte";
pub const LABEL_GENERATING: &str = "Génération en cours...";
