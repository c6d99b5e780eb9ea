// Linguaflow - terminal front-end for the language-learning client
// Entry point and command dispatch

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use linguaflow::api::{CardStatus, Grade, NewCard, VocabQuery};
use linguaflow::app::{self, AppState};
use linguaflow::events::{AppEvent, NotificationLevel};
use linguaflow::services::review::{ReviewDirection, ReviewSession, ReviewState};
use linguaflow::services::workspace::{CloudSaveOutcome, WorkspaceDraft};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "linguaflow", version, about = "Vocabulary review and transcript drafts from the terminal")]
struct Cli {
    /// Directory holding the local database and settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Learning language for this invocation (defaults to the saved one)
    #[arg(long, short, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store the API bearer token
    Login { token: String },
    /// Forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or change the learning language
    Lang { language: Option<String> },
    /// Browse and edit vocabulary
    Vocab {
        #[command(subcommand)]
        command: VocabCommand,
    },
    /// Review due cards
    Review {
        #[arg(long)]
        limit: Option<u32>,
        /// Show the translation first
        #[arg(long)]
        reverse: bool,
    },
    /// Local transcript drafts
    Drafts {
        #[command(subcommand)]
        command: DraftsCommand,
    },
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    tag: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    offset: Option<u32>,
}

#[derive(Subcommand)]
enum VocabCommand {
    List(ListArgs),
    Due {
        #[arg(long)]
        limit: Option<u32>,
    },
    Stats,
    Add {
        word: String,
        #[arg(long, short)]
        translation: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    Delete {
        id: String,
        /// Remove permanently instead of suspending
        #[arg(long)]
        hard: bool,
    },
}

#[derive(Subcommand)]
enum DraftsCommand {
    List,
    Show {
        id: String,
    },
    /// Start a draft from a text file
    Import {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        source_url: Option<String>,
    },
    /// Save a draft's transcript to the cloud
    Push {
        id: String,
    },
    Delete {
        id: String,
    },
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linguaflow=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => app::default_data_dir()?,
    };
    let state = app::setup(&data_dir)
        .await
        .context("Failed to initialize application")?;

    let printer = spawn_notification_printer(&state);
    let result = run(&state, cli.language, cli.command).await;

    // Closing the bus lets the printer flush what is left
    drop(state);
    let _ = printer.await;

    result
}

async fn run(state: &AppState, language: Option<String>, command: Command) -> anyhow::Result<()> {
    let language = match language {
        Some(language) => language,
        None => state.settings.get_learning_language().await?,
    };

    match command {
        Command::Login { token } => {
            state.tokens.set(&token).await?;
            println!("Token saved");
        }
        Command::Logout => {
            state.tokens.clear().await?;
            println!("Signed out");
        }
        Command::Whoami => match state.auth.current_user().await {
            Some(user) if !user.email.is_empty() => println!("{} <{}>", user.name, user.email),
            Some(user) => println!("{}", user.sub),
            None => println!("Not signed in"),
        },
        Command::Lang { language: None } => println!("{}", language),
        Command::Lang {
            language: Some(new_language),
        } => {
            state.settings.set_learning_language(&new_language).await?;
            println!("Learning language set to {}", new_language.to_lowercase());
        }
        Command::Vocab { command } => run_vocab(state, &language, command).await?,
        Command::Review { limit, reverse } => run_review(state, &language, limit, reverse).await?,
        Command::Drafts { command } => run_drafts(state, &language, command).await?,
    }

    Ok(())
}

/// Print notifications published by services
fn spawn_notification_printer(state: &AppState) -> JoinHandle<()> {
    let mut rx = state.events.subscribe();

    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                AppEvent::Notification { level, message } => {
                    let prefix = match level {
                        NotificationLevel::Success => "ok",
                        NotificationLevel::Error => "error",
                        NotificationLevel::Warning => "warning",
                        NotificationLevel::Info => "info",
                    };
                    eprintln!("[{}] {}", prefix, message);
                }
                AppEvent::Unauthorized => eprintln!("Run `linguaflow login <token>` to sign in again."),
                _ => {}
            }
        }
    })
}

async fn run_vocab(state: &AppState, language: &str, command: VocabCommand) -> anyhow::Result<()> {
    match command {
        VocabCommand::List(args) => {
            let query = VocabQuery {
                q: args.q,
                status: args.status.map(|s| s.parse::<CardStatus>()).transpose()?,
                tag: args.tag,
                limit: args.limit,
                offset: args.offset,
                ..VocabQuery::for_language(language)
            };
            let page = state.vocab.list(&query).await?;
            for card in &page.items {
                println!(
                    "{}  {} = {}  [{}]",
                    card.id,
                    card.word,
                    card.translation.as_deref().unwrap_or("-"),
                    card.review_stats.status.as_str()
                );
            }
            println!("{} of {} cards", page.items.len(), page.total);
        }
        VocabCommand::Due { limit } => {
            let limit = match limit {
                Some(limit) => limit,
                None => state.settings.get_review().await?.due_limit,
            };
            let due = state.vocab.due(language, limit).await?;
            for card in &due.cards {
                println!("{}  {}", card.id, card.word);
            }
            println!("{} due", due.count.max(due.cards.len() as u64));
        }
        VocabCommand::Stats => {
            let stats = state.vocab.stats(language).await?;
            println!("Total cards:    {}", stats.total_cards);
            println!("Due today:      {}", stats.due_today);
            println!("Reviewed today: {}", stats.reviewed_today);
            let mut levels: Vec<_> = stats.cards_by_level.iter().collect();
            levels.sort();
            for (level, count) in levels {
                println!("  {:<12}{}", level, count);
            }
        }
        VocabCommand::Add {
            word,
            translation,
            tags,
        } => {
            let card = NewCard {
                word,
                translation,
                notes: Vec::new(),
                tags,
            };
            let created = state.vocab.create(language, &card).await?;
            println!("Added {} ({})", created.word, created.id);
        }
        VocabCommand::Delete { id, hard } => {
            if hard {
                state.vocab.hard_delete(&id, Some(language)).await?;
            } else {
                state.vocab.delete(&id).await?;
            }
            println!("Deleted {}", id);
        }
    }

    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> anyhow::Result<Option<String>> {
    eprint!("{} ", text);
    Ok(lines.next_line().await?.map(|line| line.trim().to_lowercase()))
}

async fn run_review(
    state: &AppState,
    language: &str,
    limit: Option<u32>,
    reverse: bool,
) -> anyhow::Result<()> {
    let review_settings = state.settings.get_review().await?;
    let direction = if reverse {
        ReviewDirection::TranslationToWord
    } else {
        review_settings.direction
    };
    let limit = limit.unwrap_or(review_settings.due_limit);

    let mut session = state.review.start_session(language, limit, direction).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match session.state() {
            ReviewState::Showing { index, flipped } => {
                let Some(faces) = session.current_faces() else {
                    bail!("Review session lost its current card");
                };
                println!("\n[{}/{}] {}", index + 1, session.total(), faces.front);
                if flipped {
                    println!("      {}", faces.back);
                }

                let Some(input) = prompt(&mut lines, "(f)lip, 1-4 grade, (p)rev, (n)ext, (s)ubmit, (q)uit >").await? else {
                    return Ok(());
                };

                let result = match input.as_str() {
                    "" | "f" => session.flip(),
                    "p" => session.prev(),
                    "n" => session.next(),
                    "s" => session.request_submit(),
                    "q" => return Ok(()),
                    other => match other.chars().next().and_then(Grade::from_key) {
                        Some(grade) => session.mark(grade),
                        None => {
                            println!("Unknown command: {}", other);
                            Ok(())
                        }
                    },
                };
                if let Err(e) = result {
                    println!("{}", e);
                }
            }
            ReviewState::Confirming { .. } => {
                print_summary(&session);
                let answer = prompt(&mut lines, "Submit review session? [y/N]").await?;
                if answer.as_deref() == Some("y") {
                    state.review.submit(&mut session).await?;
                } else {
                    session.cancel_confirm()?;
                }
            }
            ReviewState::Done { reviewed } => {
                println!("Reviewed {} cards", reviewed);
                return Ok(());
            }
            ReviewState::Idle | ReviewState::Submitting => return Ok(()),
        }
    }
}

fn print_summary(session: &ReviewSession) {
    let summary = session.summary();

    println!(
        "\nTotal {}  Reviewed {}  Remaining {}  Current {}",
        summary.total, summary.reviewed, summary.remaining, summary.current
    );
    let counts: Vec<String> = summary
        .grade_counts
        .iter()
        .map(|(grade, count)| format!("{} {}", grade, count))
        .collect();
    println!("{}", counts.join("  "));

    for row in &summary.rows {
        println!(
            "  {:<20} {:<20} {:<9} {}",
            row.word,
            row.translation.as_deref().unwrap_or("-"),
            if row.reviewed { "Reviewed" } else { "Pending" },
            row.grade.map(|g| g.as_str()).unwrap_or("-")
        );
    }
}

async fn run_drafts(state: &AppState, language: &str, command: DraftsCommand) -> anyhow::Result<()> {
    match command {
        DraftsCommand::List => {
            let drafts = state.workspace.list_drafts(language).await;
            if drafts.is_empty() {
                println!("No drafts");
            }
            for draft in drafts {
                println!(
                    "{}  {}  (updated {}, expires {})",
                    draft.id,
                    draft.title,
                    draft.updated_at.format("%Y-%m-%d %H:%M"),
                    draft.expires_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        DraftsCommand::Show { id } => match state.workspace.load_draft(&id).await {
            Some(draft) => {
                println!("{} [{}] {}", draft.title, draft.status, draft.language);
                if let Some(url) = &draft.source_url {
                    println!("Source: {}", url);
                }
                println!("\n{}", draft.transcript);
                for note in &draft.notes {
                    println!("- {}", note);
                }
            }
            None => println!("Draft {} not found", id),
        },
        DraftsCommand::Import {
            file,
            title,
            source_url,
        } => {
            let transcript = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut draft = WorkspaceDraft::start(language);
            draft.transcript = transcript;
            draft.source_url = source_url;
            if let Some(title) = title {
                draft.title = title;
            }

            match state.workspace.autosave(&draft).await {
                Some(saved) => println!("Created draft {}", saved.id),
                None => bail!("Nothing to import from {}", file.display()),
            }
        }
        DraftsCommand::Push { id } => {
            let Some(stored) = state.workspace.load_draft(&id).await else {
                bail!("Draft {} not found", id);
            };
            let draft = WorkspaceDraft::from(stored);
            if state.workspace.save_to_cloud(&draft).await == CloudSaveOutcome::Failed {
                bail!("Draft {} was not saved", id);
            }
        }
        DraftsCommand::Delete { id } => state.workspace.discard(&id).await,
        DraftsCommand::Cleanup => {
            let removed = state.workspace.cleanup().await;
            println!("Removed {} expired drafts", removed);
        }
    }

    Ok(())
}
