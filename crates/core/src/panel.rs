//! The story tab view-model.
//!
//! [`StoryPanel`] owns every piece of state the tab shows: the creation dialog and its draft, the
//! loaded sessions and their selection, the viewer's page index and the pending notifications.
//! It never owns the story list. The list is passed in for rendering, and a finished generation
//! returns the new [`Story`] so the owner of the list can append it.
//!
//! All transitions are synchronous method calls. Generation is the one asynchronous step; see
//! [`crate::generation`] for how a [`GenerationTicket`] is driven to completion.

use crate::constants::{
    LABEL_CREATE, LABEL_CREATE_FIRST, LABEL_EMPTY_LIST, LABEL_EXPORT, LABEL_GENERATE,
    LABEL_GENERATING, LABEL_NO_SESSIONS, LABEL_PANEL_DESCRIPTION, LABEL_PANEL_TITLE, LABEL_VIEW, MSG_EXPORT_FAILED, MSG_EXPORT_SUCCEEDED,
    MSG_GENERATION_FAILED, MSG_GENERATION_SUCCEEDED, MSG_TITLE_REQUIRED, SESSION_PREVIEW_CHARS,
};
use crate::dates::format_long_date;
use crate::error::{GenerationError, StoryError, StoryResult};
use crate::export::{export_story, ExportSink, ExportedFile};
use crate::generation::{GenerationRequest, GenerationTicket};
use crate::sessions::SessionSource;
use crate::story::{Session, Story};
use crate::views::{
    CreationView, Notification, SessionRow, StoryListCard, StoryListView, StoryRow, ViewerView,
};
use std::collections::BTreeSet;
use std::mem;
use tales_types::{PatientId, StoryTitle};
use tokio_util::sync::CancellationToken;

/// Editable fields of the creation form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Title,
    Objectives,
    Morals,
    AdditionalNotes,
}

/// Unsubmitted contents of the creation form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub title: String,
    pub objectives: String,
    pub morals: String,
    pub additional_notes: String,
}

impl FormDraft {
    fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Title => &mut self.title,
            FormField::Objectives => &mut self.objectives,
            FormField::Morals => &mut self.morals,
            FormField::AdditionalNotes => &mut self.additional_notes,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    cancel: CancellationToken,
}

#[derive(Debug)]
struct Viewer {
    story: Story,
    page: usize,
}

/// View-model of the story tab for one patient.
#[derive(Debug)]
pub struct StoryPanel {
    patient_id: PatientId,
    sessions: Vec<Session>,
    selected: BTreeSet<String>,
    creation_open: bool,
    draft: FormDraft,
    in_flight: Option<InFlight>,
    next_seq: u64,
    /// Parent of every generation token; cancelled when the panel is dropped.
    lifetime: CancellationToken,
    viewer: Option<Viewer>,
    notifications: Vec<Notification>,
}

impl StoryPanel {
    /// Creates the panel for `patient_id` and loads its sessions, all selected.
    ///
    /// # Errors
    ///
    /// Propagates any error from `sessions`.
    pub fn new(patient_id: PatientId, sessions: &dyn SessionSource) -> StoryResult<Self> {
        let mut panel = Self {
            patient_id,
            sessions: Vec::new(),
            selected: BTreeSet::new(),
            creation_open: false,
            draft: FormDraft::default(),
            in_flight: None,
            next_seq: 1,
            lifetime: CancellationToken::new(),
            viewer: None,
            notifications: Vec::new(),
        };
        panel.reload_sessions(sessions)?;
        Ok(panel)
    }

    pub fn patient_id(&self) -> &PatientId {
        &self.patient_id
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    /// Switches the panel to another patient. Does nothing if the patient is unchanged.
    ///
    /// Returns `true` when the sessions were reloaded. A generation in flight for the previous
    /// patient is cancelled.
    pub fn set_patient(
        &mut self,
        patient_id: PatientId,
        sessions: &dyn SessionSource,
    ) -> StoryResult<bool> {
        if patient_id == self.patient_id {
            return Ok(false);
        }

        let loaded = sessions.list_sessions(&patient_id)?;
        self.cancel_in_flight();
        self.patient_id = patient_id;
        self.replace_sessions(loaded);
        Ok(true)
    }

    /// Reloads the current patient's sessions and selects all of them.
    pub fn reload_sessions(&mut self, sessions: &dyn SessionSource) -> StoryResult<()> {
        let loaded = sessions.list_sessions(&self.patient_id)?;
        self.replace_sessions(loaded);
        Ok(())
    }

    fn replace_sessions(&mut self, loaded: Vec<Session>) {
        self.selected = loaded.iter().map(|s| s.id.clone()).collect();
        self.sessions = loaded;
        tracing::debug!(
            "loaded {} session(s) for patient {}",
            self.sessions.len(),
            self.patient_id
        );
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn selected_sessions(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_session_selected(&self, session_id: &str) -> bool {
        self.selected.contains(session_id)
    }

    /// Adds `session_id` to the selection, or removes it if already selected.
    pub fn toggle_session(&mut self, session_id: &str) {
        if !self.selected.remove(session_id) {
            self.selected.insert(session_id.to_string());
        }
    }

    // ------------------------------------------------------------------------
    // Story list
    // ------------------------------------------------------------------------

    /// Renders the caller's story list, in the order given.
    ///
    /// Both the header's create action and the empty state's call-to-action map to
    /// [`open_creation`](Self::open_creation).
    pub fn list_view(&self, stories: &[Story]) -> StoryListCard {
        StoryListCard {
            title: LABEL_PANEL_TITLE,
            description: LABEL_PANEL_DESCRIPTION,
            create_label: LABEL_CREATE,
            body: list_body(stories),
        }
    }

    // ------------------------------------------------------------------------
    // Creation dialog
    // ------------------------------------------------------------------------

    /// Opens the creation dialog. The draft and selection are kept as they were.
    pub fn open_creation(&mut self) {
        self.creation_open = true;
    }

    /// Closes the creation dialog without clearing the draft or selection.
    ///
    /// A generation in flight is cancelled; its completion will be ignored.
    pub fn cancel_creation(&mut self) {
        self.creation_open = false;
        self.cancel_in_flight();
    }

    pub fn is_creation_open(&self) -> bool {
        self.creation_open
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        *self.draft.field_mut(field) = value.into();
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.draft.title.is_empty() && !self.is_generating()
    }

    /// Validates the draft and starts a generation.
    ///
    /// On success the panel is in the generating state and the returned ticket must be driven
    /// with [`run_generation`](crate::generation::run_generation) and then passed back to
    /// [`complete_generation`](Self::complete_generation).
    ///
    /// # Errors
    ///
    /// - [`StoryError::InvalidInput`] if the creation dialog is not open.
    /// - [`StoryError::GenerationInProgress`] if a generation is already running.
    /// - [`StoryError::MissingTitle`] if the title is empty; an error notification is queued and
    ///   the draft is left untouched. Whitespace counts as a title and is kept as typed.
    pub fn submit(&mut self) -> StoryResult<GenerationTicket> {
        if !self.creation_open {
            return Err(StoryError::InvalidInput(
                "the creation dialog is not open".into(),
            ));
        }
        if self.is_generating() {
            tracing::warn!("rejected submission while a story is being generated");
            return Err(StoryError::GenerationInProgress);
        }

        let Ok(title) = StoryTitle::new(self.draft.title.as_str()) else {
            tracing::warn!("rejected submission without a title");
            self.notifications
                .push(Notification::error(MSG_TITLE_REQUIRED));
            return Err(StoryError::MissingTitle);
        };

        let request = GenerationRequest {
            patient_id: self.patient_id.clone(),
            title,
            objectives: self.draft.objectives.clone(),
            morals: self.draft.morals.clone(),
            additional_notes: self.draft.additional_notes.clone(),
            session_ids: self.selected.iter().cloned().collect(),
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let cancel = self.lifetime.child_token();
        self.in_flight = Some(InFlight {
            seq,
            cancel: cancel.clone(),
        });

        tracing::info!("submitted story generation #{} for patient {}", seq, self.patient_id);

        Ok(GenerationTicket {
            seq,
            request,
            cancel,
        })
    }

    /// Applies the outcome of generation `seq`.
    ///
    /// On success the draft and selection are cleared, the dialog closes, one success
    /// notification is queued and the new story is returned for the caller to append to its
    /// list. A failure leaves the dialog open with its draft. Results for a cancelled or
    /// superseded generation are ignored and yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::Generation`] when the current generation failed.
    pub fn complete_generation(
        &mut self,
        seq: u64,
        result: Result<Story, GenerationError>,
    ) -> StoryResult<Option<Story>> {
        match &self.in_flight {
            Some(in_flight) if in_flight.seq == seq => {}
            _ => {
                tracing::warn!("ignoring stale completion of story generation #{}", seq);
                return Ok(None);
            }
        }
        self.in_flight = None;

        match result {
            Ok(story) => {
                self.draft = FormDraft::default();
                self.selected.clear();
                self.creation_open = false;
                self.notifications
                    .push(Notification::success(MSG_GENERATION_SUCCEEDED));
                tracing::info!("story generation #{} produced story {}", seq, story.id);
                Ok(Some(story))
            }
            Err(GenerationError::Cancelled) => Err(GenerationError::Cancelled.into()),
            Err(e) => {
                tracing::warn!("story generation #{} failed: {}", seq, e);
                self.notifications
                    .push(Notification::error(MSG_GENERATION_FAILED));
                Err(e.into())
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!("cancelling story generation #{}", in_flight.seq);
            in_flight.cancel.cancel();
        }
    }

    pub fn creation_view(&self) -> CreationView {
        let sessions: Vec<SessionRow> = self
            .sessions
            .iter()
            .map(|session| SessionRow {
                session_id: session.id.clone(),
                date_label: format_long_date(&session.date),
                preview: session_preview(&session.transcription),
                selected: self.is_session_selected(&session.id),
            })
            .collect();

        CreationView {
            no_sessions_message: sessions.is_empty().then_some(LABEL_NO_SESSIONS),
            sessions,
            submit_label: if self.is_generating() {
                LABEL_GENERATING
            } else {
                LABEL_GENERATE
            },
            submit_enabled: self.can_submit(),
            generating: self.is_generating(),
        }
    }

    // ------------------------------------------------------------------------
    // Viewer
    // ------------------------------------------------------------------------

    /// Opens the viewer on `story`, always at the first page.
    pub fn view_story(&mut self, story: &Story) {
        tracing::debug!("viewing story {}", story.id);
        self.viewer = Some(Viewer {
            story: story.clone(),
            page: 0,
        });
    }

    pub fn close_viewer(&mut self) {
        self.viewer = None;
    }

    pub fn is_viewing(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn viewed_story(&self) -> Option<&Story> {
        self.viewer.as_ref().map(|v| &v.story)
    }

    pub fn current_page(&self) -> Option<usize> {
        self.viewer.as_ref().map(|v| v.page)
    }

    pub fn next_page(&mut self) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.page = (viewer.page + 1).min(viewer.story.last_page_index());
        }
    }

    pub fn previous_page(&mut self) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.page = viewer.page.saturating_sub(1);
        }
    }

    pub fn viewer_view(&self) -> Option<ViewerView> {
        let viewer = self.viewer.as_ref()?;
        let story = &viewer.story;

        Some(ViewerView {
            title: story.title.clone(),
            description: format!(
                "Conte thérapeutique généré le {}",
                format_long_date(&story.created_at)
            ),
            page_index: viewer.page,
            page_body: story.page(viewer.page).map(str::to_string),
            page_label: format!(
                "Page {} sur {}",
                viewer.page + 1,
                story.display_page_count()
            ),
            can_previous: viewer.page > 0,
            can_next: !story.pages.is_empty() && viewer.page < story.last_page_index(),
        })
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Exports `story` through `sink` and queues a notification. The viewer stays as it is.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error after queueing an error notification.
    pub fn export(&mut self, story: &Story, sink: &dyn ExportSink) -> StoryResult<ExportedFile> {
        let file = export_story(story);
        match sink.deliver(&file) {
            Ok(()) => {
                tracing::info!("exported story {} as {}", story.id, file.file_name);
                self.notifications
                    .push(Notification::success(MSG_EXPORT_SUCCEEDED));
                Ok(file)
            }
            Err(e) => {
                tracing::warn!("export of story {} failed: {}", story.id, e);
                self.notifications.push(Notification::error(MSG_EXPORT_FAILED));
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Returns and clears the queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.notifications)
    }
}

impl Drop for StoryPanel {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

fn list_body(stories: &[Story]) -> StoryListView {
    if stories.is_empty() {
        return StoryListView::Empty {
            message: LABEL_EMPTY_LIST,
            create_first_label: LABEL_CREATE_FIRST,
        };
    }

    StoryListView::Rows {
        rows: stories
            .iter()
            .map(|story| StoryRow {
                story_id: story.id.to_string(),
                title: story.title.clone(),
                created_on: format_long_date(&story.created_at),
                view_label: LABEL_VIEW,
                export_label: LABEL_EXPORT,
            })
            .collect(),
    }
}

fn session_preview(transcription: &str) -> String {
    let head: String = transcription.chars().take(SESSION_PREVIEW_CHARS).collect();
    format!("{head}...")
}
