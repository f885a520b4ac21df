use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tales_core::{
    run_generation, session_source, CoreConfig, DirectoryExportSink, FormField, NotificationLevel,
    PatientId, SimulatedGenerator, StoryListView, StoryPanel,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod stories_file;

use stories_file::{find_story, load_stories, save_stories};

#[derive(Parser)]
#[command(name = "tales")]
#[command(about = "Therapeutic story tab CLI")]
struct Cli {
    /// YAML file holding the story list
    #[arg(long, global = true, default_value = "stories.yaml")]
    stories: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List a patient's stories
    List {
        /// Patient identifier
        patient_id: String,
    },
    /// List a patient's sessions
    Sessions {
        /// Patient identifier
        patient_id: String,
    },
    /// Generate a new story and append it to the story list
    Generate {
        /// Patient identifier
        patient_id: String,
        /// Story title
        #[arg(long, default_value = "")]
        title: String,
        /// Therapeutic objectives
        #[arg(long, default_value = "")]
        objectives: String,
        /// Morals the patient should take away
        #[arg(long, default_value = "")]
        morals: String,
        /// Additional notes for the generator
        #[arg(long, default_value = "")]
        notes: String,
        /// Session to leave out (repeatable); all sessions are used by default
        #[arg(long = "exclude-session")]
        exclude_sessions: Vec<String>,
    },
    /// Show one page of a story
    View {
        /// Story identifier
        story_id: String,
        /// Page to open (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Export a story as a text file
    Export {
        /// Story identifier
        story_id: String,
        /// Output directory (defaults to TALES_EXPORT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tales_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = CoreConfig::from_env_values(
        std::env::var("TALES_GENERATION_DELAY_MS").ok(),
        std::env::var("TALES_EXPORT_DIR").ok(),
        std::env::var("TALES_SESSIONS_DIR").ok(),
    )?;
    let sessions = session_source(&cfg);

    match cli.command {
        Some(Commands::List { patient_id }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let stories: Vec<_> = load_stories(&cli.stories)?
                .into_iter()
                .filter(|s| s.patient_id == patient_id)
                .collect();
            let panel = StoryPanel::new(patient_id, &NoSessions)?;
            let card = panel.list_view(&stories);
            println!("{} - {}", card.title, card.description);
            match card.body {
                StoryListView::Empty {
                    message,
                    create_first_label,
                } => {
                    println!("{}", message);
                    println!(
                        "{}: tales generate {} --title <title>",
                        create_first_label,
                        panel.patient_id()
                    );
                }
                StoryListView::Rows { rows } => {
                    for row in rows {
                        println!(
                            "ID: {}, Title: {}, Created: {}",
                            row.story_id, row.title, row.created_on
                        );
                    }
                    println!(
                        "{}: tales generate {} --title <title>",
                        card.create_label,
                        panel.patient_id()
                    );
                }
            }
        }
        Some(Commands::Sessions { patient_id }) => {
            let panel = StoryPanel::new(PatientId::parse(&patient_id)?, sessions.as_ref())?;
            let view = panel.creation_view();
            if let Some(message) = view.no_sessions_message {
                println!("{}", message);
            }
            for row in view.sessions {
                let mark = if row.selected { "x" } else { " " };
                println!("[{}] {} {} {}", mark, row.session_id, row.date_label, row.preview);
            }
        }
        Some(Commands::Generate {
            patient_id,
            title,
            objectives,
            morals,
            notes,
            exclude_sessions,
        }) => {
            let mut stories = load_stories(&cli.stories)?;
            let mut panel = StoryPanel::new(PatientId::parse(&patient_id)?, sessions.as_ref())?;

            panel.open_creation();
            panel.set_field(FormField::Title, title);
            panel.set_field(FormField::Objectives, objectives);
            panel.set_field(FormField::Morals, morals);
            panel.set_field(FormField::AdditionalNotes, notes);
            for id in &exclude_sessions {
                if panel.is_session_selected(id) {
                    panel.toggle_session(id);
                }
            }

            let ticket = match panel.submit() {
                Ok(ticket) => ticket,
                Err(e) => {
                    print_notifications(&mut panel);
                    return Err(e.into());
                }
            };

            println!("{}", panel.creation_view().submit_label);
            let generator = SimulatedGenerator::new(cfg.generation_delay());
            let result = tokio::select! {
                result = run_generation(&generator, &ticket) => result,
                _ = tokio::signal::ctrl_c() => {
                    panel.cancel_creation();
                    eprintln!("Generation cancelled");
                    return Ok(());
                }
            };

            let outcome = panel.complete_generation(ticket.seq(), result);
            print_notifications(&mut panel);
            if let Some(story) = outcome? {
                println!("Generated story with ID: {}", story.id);
                stories.push(story);
                save_stories(&cli.stories, &stories)?;
            }
        }
        Some(Commands::View { story_id, page }) => {
            let stories = load_stories(&cli.stories)?;
            let story = find_story(&stories, &story_id)?;
            let mut panel = StoryPanel::new(story.patient_id.clone(), &NoSessions)?;

            panel.view_story(story);
            for _ in 1..page {
                panel.next_page();
            }

            if let Some(view) = panel.viewer_view() {
                println!("{}", view.title);
                println!("{}", view.description);
                println!();
                println!("{}", view.page_body.unwrap_or_default());
                println!();
                println!(
                    "{} {} {}",
                    if view.can_previous { "<" } else { " " },
                    view.page_label,
                    if view.can_next { ">" } else { " " }
                );
            }
        }
        Some(Commands::Export { story_id, out }) => {
            let stories = load_stories(&cli.stories)?;
            let story = find_story(&stories, &story_id)?;
            let mut panel = StoryPanel::new(story.patient_id.clone(), &NoSessions)?;
            let sink =
                DirectoryExportSink::new(out.unwrap_or_else(|| cfg.export_dir().to_path_buf()));

            let outcome = panel.export(story, &sink);
            print_notifications(&mut panel);
            let file = outcome?;
            println!("Wrote {}", sink.dir().join(&file.file_name).display());
        }
        None => {
            println!("Use 'tales --help' for commands");
        }
    }

    Ok(())
}

/// Session source for commands that never look at sessions.
struct NoSessions;

impl tales_core::SessionSource for NoSessions {
    fn list_sessions(
        &self,
        _patient_id: &PatientId,
    ) -> tales_core::StoryResult<Vec<tales_core::Session>> {
        Ok(Vec::new())
    }
}

fn print_notifications(panel: &mut StoryPanel) {
    for notification in panel.take_notifications() {
        match notification.level {
            NotificationLevel::Success => println!("{}", notification.message),
            NotificationLevel::Error => eprintln!("Error: {}", notification.message),
        }
    }
}
