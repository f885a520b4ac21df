//! Render-ready snapshots produced by the panel.
//!
//! These carry already-formatted labels so a front end only has to lay them out.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient user-facing message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// One row of the story list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoryRow {
    pub story_id: String,
    pub title: String,
    pub created_on: String,
    pub view_label: &'static str,
    pub export_label: &'static str,
}

/// Body of the story list card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryListView {
    /// No stories yet: a message and a call-to-action that opens the creation dialog.
    Empty {
        message: &'static str,
        create_first_label: &'static str,
    },
    Rows { rows: Vec<StoryRow> },
}

/// The story list card: header, the always-present create action, and the body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoryListCard {
    pub title: &'static str,
    pub description: &'static str,
    pub create_label: &'static str,
    pub body: StoryListView,
}

/// One selectable session in the creation dialog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionRow {
    pub session_id: String,
    pub date_label: String,
    pub preview: String,
    pub selected: bool,
}

/// Snapshot of the creation dialog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreationView {
    pub sessions: Vec<SessionRow>,
    /// Shown instead of the session table when there are no sessions.
    pub no_sessions_message: Option<&'static str>,
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub generating: bool,
}

/// Snapshot of the story viewing dialog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewerView {
    pub title: String,
    pub description: String,
    pub page_index: usize,
    pub page_body: Option<String>,
    pub page_label: String,
    pub can_previous: bool,
    pub can_next: bool,
}
