//! Story generation.
//!
//! Generation is an asynchronous operation behind [`StoryGenerator`]. The panel never awaits it
//! directly: [`StoryPanel::submit`](crate::panel::StoryPanel::submit) hands out a
//! [`GenerationTicket`], the caller drives [`run_generation`] on its runtime and feeds the result
//! back through [`StoryPanel::complete_generation`](crate::panel::StoryPanel::complete_generation).
//! The ticket's cancellation token is a child of the panel's, so closing the dialog or dropping
//! the panel stops the work.

use crate::error::GenerationError;
use crate::story::{Story, StoryKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tales_types::{PatientId, StoryId, StoryTitle};
use tokio_util::sync::CancellationToken;

/// Everything the clinician entered for a new story.
///
/// The simulated generator only uses the patient and title; the remaining fields are carried so a
/// real backend can consume them without changing the panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub patient_id: PatientId,
    pub title: StoryTitle,
    pub objectives: String,
    pub morals: String,
    pub additional_notes: String,
    pub session_ids: Vec<String>,
}

/// Produces a story from a request.
pub trait StoryGenerator: Send + Sync {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<Story, GenerationError>> + Send;
}

const SIMULATED_PAGES: [&str; 3] = [
    "Il était une fois un petit animal nommé Léo. Léo était un jeune renard très intelligent, mais qui avait beaucoup de mal à faire confiance aux autres animaux de la forêt.",
    "Un jour, alors qu'une tempête menaçait, Léo dut accepter l'aide d'autres animaux pour mettre son terrier à l'abri.",
    "Grâce à cette expérience, Léo comprit que faire confiance aux autres pouvait parfois être nécessaire et bénéfique.",
];

const SIMULATED_CONTENT: &str = "Il était une fois un petit animal nommé Léo...";

/// Stand-in generator: waits for a fixed delay and returns the same three-page story every time.
#[derive(Clone, Debug)]
pub struct SimulatedGenerator {
    delay: Duration,
}

impl SimulatedGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl StoryGenerator for SimulatedGenerator {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<Story, GenerationError>> + Send {
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;

            Ok(Story {
                id: StoryId::generate(),
                patient_id: request.patient_id,
                title: request.title.into_inner(),
                kind: StoryKind::Therapeutic,
                content: SIMULATED_CONTENT.to_string(),
                created_at: Utc::now(),
                pages: SIMULATED_PAGES.iter().map(|p| p.to_string()).collect(),
            })
        }
    }
}

/// A submitted generation, handed out by the panel.
#[derive(Clone, Debug)]
pub struct GenerationTicket {
    pub(crate) seq: u64,
    pub(crate) request: GenerationRequest,
    pub(crate) cancel: CancellationToken,
}

impl GenerationTicket {
    /// Sequence number to pass back to `complete_generation`.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Runs `generator` for `ticket`, stopping early if the ticket is cancelled.
pub async fn run_generation<G>(
    generator: &G,
    ticket: &GenerationTicket,
) -> Result<Story, GenerationError>
where
    G: StoryGenerator,
{
    if ticket.cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }

    tracing::info!(
        "generating story {:?} for patient {} from {} session(s)",
        ticket.request.title.as_str(),
        ticket.request.patient_id,
        ticket.request.session_ids.len()
    );

    tokio::select! {
        biased;
        _ = ticket.cancel.cancelled() => {
            tracing::info!("story generation #{} cancelled", ticket.seq);
            Err(GenerationError::Cancelled)
        }
        result = generator.generate(ticket.request.clone()) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> GenerationRequest {
        GenerationRequest {
            patient_id: PatientId::parse("p1").unwrap(),
            title: StoryTitle::new(title).unwrap(),
            objectives: "Apprendre la confiance".into(),
            morals: "On n'est jamais seul".into(),
            additional_notes: String::new(),
            session_ids: vec!["1".into(), "3".into()],
        }
    }

    fn ticket(title: &str) -> GenerationTicket {
        GenerationTicket {
            seq: 1,
            request: request(title),
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_generator_waits_then_returns_fixed_story() {
        let generator = SimulatedGenerator::new(Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        let story = generator
            .generate(request("Le renard"))
            .await
            .expect("simulated generation cannot fail");

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(story.title, "Le renard");
        assert_eq!(story.patient_id.as_str(), "p1");
        assert_eq!(story.kind, StoryKind::Therapeutic);
        assert_eq!(story.pages.len(), 3);
        assert!(story.pages[0].starts_with("Il était une fois"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_generation_returns_cancelled_when_token_fires() {
        let generator = SimulatedGenerator::new(Duration::from_secs(3));
        let ticket = ticket("Le renard");
        let cancel = ticket.cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });

        let result = run_generation(&generator, &ticket).await;
        assert_eq!(result, Err(GenerationError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn run_generation_skips_already_cancelled_ticket() {
        let generator = SimulatedGenerator::new(Duration::from_secs(3));
        let ticket = ticket("Le renard");
        ticket.cancel.cancel();

        assert_eq!(
            run_generation(&generator, &ticket).await,
            Err(GenerationError::Cancelled)
        );
    }
}
