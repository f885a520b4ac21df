//! # API REST
//!
//! REST API for the story tab.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, download headers)
//!
//! Every story operation goes through `tales-core`; a generation request drives a short-lived
//! [`StoryPanel`] so validation and notifications match the interactive tab exactly.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tales_core::constants::MSG_TITLE_REQUIRED;
use tales_core::{
    export_story, run_generation, CoreConfig, FormField, PatientId, Session, SessionSource,
    SimulatedGenerator, Story, StoryError, StoryId, StoryKind, StoryPanel,
};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub generator: Arc<SimulatedGenerator>,
    pub sessions: Arc<dyn SessionSource>,
}

impl AppState {
    /// Builds the state from resolved configuration.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let generator = Arc::new(SimulatedGenerator::new(cfg.generation_delay()));
        let sessions: Arc<dyn SessionSource> = Arc::from(tales_core::session_source(&cfg));
        Self {
            cfg,
            generator,
            sessions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    pub id: String,
    pub patient_id: String,
    pub date: DateTime<Utc>,
    pub transcription: String,
}

impl From<Session> for SessionDto {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            patient_id: session.patient_id.to_string(),
            date: session.date,
            transcription: session.transcription,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListSessionsRes {
    pub sessions: Vec<SessionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoryDto {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    #[serde(rename = "type", default = "default_story_type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pages: Vec<String>,
}

fn default_story_type() -> String {
    "therapeutic".into()
}

impl From<Story> for StoryDto {
    fn from(story: Story) -> Self {
        let kind = match story.kind {
            StoryKind::Therapeutic => "therapeutic",
        };
        Self {
            id: story.id.to_string(),
            patient_id: story.patient_id.to_string(),
            title: story.title,
            kind: kind.into(),
            content: story.content,
            created_at: story.created_at,
            pages: story.pages,
        }
    }
}

impl TryFrom<StoryDto> for Story {
    type Error = StoryError;

    fn try_from(dto: StoryDto) -> Result<Self, Self::Error> {
        let kind = match dto.kind.as_str() {
            "therapeutic" => StoryKind::Therapeutic,
            other => {
                return Err(StoryError::InvalidInput(format!(
                    "unknown story type '{other}'"
                )))
            }
        };
        Ok(Story {
            id: StoryId::from(dto.id),
            patient_id: PatientId::parse(&dto.patient_id)?,
            title: dto.title,
            kind,
            content: dto.content,
            created_at: dto.created_at,
            pages: dto.pages,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateStoryReq {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objectives: String,
    #[serde(default)]
    pub morals: String,
    #[serde(default)]
    pub additional_notes: String,
    /// Sessions to base the story on. Omitted means every session of the patient.
    #[serde(default)]
    pub session_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateStoryRes {
    pub story: StoryDto,
    pub notifications: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_sessions, generate_story, export_story_file),
    components(schemas(
        HealthRes,
        SessionDto,
        ListSessionsRes,
        StoryDto,
        GenerateStoryReq,
        GenerateStoryRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with OpenAPI docs and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients/:patient_id/sessions", get(list_sessions))
        .route("/patients/:patient_id/stories", post(generate_story))
        .route("/stories/export", post(export_story_file))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_patient_id(raw: &str) -> Result<PatientId, (StatusCode, &'static str)> {
    PatientId::parse(raw).map_err(|e| {
        tracing::warn!("rejected patient id {:?}: {}", raw, e);
        (StatusCode::BAD_REQUEST, "Invalid patient id")
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Tales REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients/{patient_id}/sessions",
    params(("patient_id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Sessions of the patient", body = ListSessionsRes),
        (status = 400, description = "Invalid patient id"),
        (status = 500, description = "Internal server error")
    )
)]
/// List the recorded sessions of a patient
///
/// # Errors
/// Returns `500 Internal Server Error` if the session source cannot be read.
#[axum::debug_handler]
async fn list_sessions(
    State(state): State<AppState>,
    AxumPath(patient_id): AxumPath<String>,
) -> Result<Json<ListSessionsRes>, (StatusCode, &'static str)> {
    let patient_id = parse_patient_id(&patient_id)?;

    match state.sessions.list_sessions(&patient_id) {
        Ok(sessions) => Ok(Json(ListSessionsRes {
            sessions: sessions.into_iter().map(SessionDto::from).collect(),
        })),
        Err(e) => {
            tracing::error!("List sessions error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/patients/{patient_id}/stories",
    params(("patient_id" = String, Path, description = "Patient identifier")),
    request_body = GenerateStoryReq,
    responses(
        (status = 201, description = "Story generated", body = GenerateStoryRes),
        (status = 400, description = "Missing title or invalid patient id"),
        (status = 500, description = "Internal server error")
    )
)]
/// Generate a new story for a patient
///
/// Runs the same open → edit → submit → complete sequence as the interactive tab. The caller
/// owns its story list and is expected to append the returned story.
///
/// # Errors
/// - `400 Bad Request` if the title is empty or the patient id is invalid.
/// - `500 Internal Server Error` if sessions cannot be loaded or generation fails.
#[axum::debug_handler]
async fn generate_story(
    State(state): State<AppState>,
    AxumPath(patient_id): AxumPath<String>,
    Json(req): Json<GenerateStoryReq>,
) -> Result<(StatusCode, Json<GenerateStoryRes>), (StatusCode, &'static str)> {
    let patient_id = parse_patient_id(&patient_id)?;

    let mut panel = StoryPanel::new(patient_id, state.sessions.as_ref()).map_err(|e| {
        tracing::error!("Load sessions error: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    })?;

    panel.open_creation();
    panel.set_field(FormField::Title, req.title);
    panel.set_field(FormField::Objectives, req.objectives);
    panel.set_field(FormField::Morals, req.morals);
    panel.set_field(FormField::AdditionalNotes, req.additional_notes);
    if let Some(wanted) = req.session_ids {
        select_exactly(&mut panel, &wanted);
    }

    let ticket = match panel.submit() {
        Ok(ticket) => ticket,
        Err(StoryError::MissingTitle) => {
            return Err((StatusCode::BAD_REQUEST, MSG_TITLE_REQUIRED));
        }
        Err(e) => {
            tracing::error!("Submit story error: {:?}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"));
        }
    };

    let result = run_generation(state.generator.as_ref(), &ticket).await;
    match panel.complete_generation(ticket.seq(), result) {
        Ok(Some(story)) => Ok((
            StatusCode::CREATED,
            Json(GenerateStoryRes {
                story: story.into(),
                notifications: panel
                    .take_notifications()
                    .into_iter()
                    .map(|n| n.message)
                    .collect(),
            }),
        )),
        Ok(None) => {
            tracing::error!("Story generation #{} was superseded", ticket.seq());
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
        Err(e) => {
            tracing::error!("Generate story error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

/// Toggles sessions until the selection is exactly `wanted`.
fn select_exactly(panel: &mut StoryPanel, wanted: &[String]) {
    let unwanted: Vec<String> = panel
        .selected_sessions()
        .iter()
        .filter(|id| !wanted.contains(*id))
        .cloned()
        .collect();
    for id in unwanted {
        panel.toggle_session(&id);
    }
    for id in wanted {
        if !panel.is_session_selected(id) {
            panel.toggle_session(id);
        }
    }
}

#[utoipa::path(
    post,
    path = "/stories/export",
    request_body = StoryDto,
    responses(
        (status = 200, description = "Plain-text story download", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid story")
    )
)]
/// Export a story as a plain-text download
///
/// The body is the story's pages separated by blank lines; the suggested file name is the title
/// with whitespace replaced by underscores.
#[axum::debug_handler]
async fn export_story_file(
    State(_state): State<AppState>,
    Json(dto): Json<StoryDto>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let story = Story::try_from(dto).map_err(|e| {
        tracing::warn!("rejected story export: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid story")
    })?;

    let file = export_story(&story);
    tracing::info!("exporting story {} as {}", story.id, file.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, file.media_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        file.contents,
    ))
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8 name (RFC 6266).
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let cfg = CoreConfig::new(Duration::from_millis(10), "exports".into(), None)
            .expect("CoreConfig::new should succeed");
        router(AppState::new(Arc::new(cfg)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    #[tokio::test]
    async fn lists_mock_sessions() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/patients/p1/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sessions"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["sessions"][0]["patient_id"], "p1");
    }

    #[tokio::test]
    async fn generate_rejects_empty_title() {
        let response = app()
            .oneshot(post_json(
                "/patients/p1/stories",
                serde_json::json!({ "title": "" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_returns_new_story() {
        let response = app()
            .oneshot(post_json(
                "/patients/p1/stories",
                serde_json::json!({
                    "title": "Le renard",
                    "objectives": "Confiance",
                    "session_ids": ["2"]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["story"]["title"], "Le renard");
        assert_eq!(json["story"]["type"], "therapeutic");
        assert_eq!(json["story"]["pages"].as_array().map(Vec::len), Some(3));
        assert_eq!(
            json["notifications"][0],
            "Conte thérapeutique généré avec succès"
        );
    }

    #[tokio::test]
    async fn export_sets_download_headers() {
        let response = app()
            .oneshot(post_json(
                "/stories/export",
                serde_json::json!({
                    "id": "42",
                    "patient_id": "p1",
                    "title": "My Tale",
                    "type": "therapeutic",
                    "content": "A B",
                    "created_at": "2023-03-15T14:30:00Z",
                    "pages": ["A", "B"]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"My_Tale.txt\"; filename*=UTF-8''My_Tale.txt"
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain;charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"A\n\nB");
    }

    #[tokio::test]
    async fn export_encodes_non_ascii_file_name() {
        let response = app()
            .oneshot(post_json(
                "/stories/export",
                serde_json::json!({
                    "id": "43",
                    "patient_id": "p1",
                    "title": "Léo le renard",
                    "created_at": "2023-03-15T14:30:00Z",
                    "pages": ["A"]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"L_o_le_renard.txt\"; filename*=UTF-8''L%C3%A9o_le_renard.txt"
        );
    }

    #[test]
    fn content_disposition_escapes_quotes_in_fallback() {
        assert_eq!(
            content_disposition("a\"b.txt"),
            "attachment; filename=\"a_b.txt\"; filename*=UTF-8''a%22b.txt"
        );
    }

    #[test]
    fn select_exactly_matches_requested_sessions() {
        let mut panel = StoryPanel::new(
            PatientId::parse("p1").unwrap(),
            &tales_core::MockSessionSource::new(),
        )
        .unwrap();

        select_exactly(&mut panel, &["3".to_string(), "9".to_string()]);

        let selected: Vec<&str> = panel.selected_sessions().iter().map(String::as_str).collect();
        assert_eq!(selected, ["3", "9"]);
    }
}
