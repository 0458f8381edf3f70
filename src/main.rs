use anyhow::{bail, Context, Result};
use recipe_companion::api_connection::endpoints::{Credentials, SignupRequest};
use recipe_companion::api_connection::{ApiClient, ApiConnectionError};
use recipe_companion::chat::{ChatSession, StepContext};
use recipe_companion::cli::{parse_args, Command};
use recipe_companion::config::AppConfig;
use recipe_companion::generation::{generate_from_detections, GenerationThrottle};
use recipe_companion::progress::{
    sync_transition, CookingSession, JsonFileStore, ProgressStore, StorageKey, StoredRecipe,
    SyncOutcome, Transition,
};
use recipe_companion::recipe_library::{save_if_new, SaveOutcome};
use recipe_companion::recipe_parser::{self, step_minutes};
use recipe_companion::speech::{speak_step, LogSpeaker, Speaker};
use recipe_companion::timer::{StepTimer, TimerSink};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing_subscriber::EnvFilter;

/// Prints the countdown and silences speech when it stops.
struct ConsoleTimerSink {
    speaker: LogSpeaker,
}

impl TimerSink for ConsoleTimerSink {
    fn tick(&self, remaining_secs: u64) {
        println!("⏱  {:02}:{:02}", remaining_secs / 60, remaining_secs % 60);
    }

    fn finished(&self) {
        println!("⏰ Time's up!");
    }

    fn stop_all(&self) {
        self.speaker.cancel();
    }
}

fn notify(message: &str) {
    eprintln!("⚠️  {}", message);
}

fn describe_api_error(e: &ApiConnectionError, fallback: &str) -> String {
    if e.is_auth_failure() {
        "Please login first".to_string()
    } else {
        format!("{}: {}", fallback, e)
    }
}

async fn read_recipe(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recipe file '{}'", path.display()))
}

fn recipe_from_text(raw: &str, title: Option<String>) -> StoredRecipe {
    match title {
        Some(title) => StoredRecipe::new(title, raw),
        None => StoredRecipe::from_text(raw),
    }
}

fn current_session(store: JsonFileStore) -> Result<CookingSession<JsonFileStore>> {
    match CookingSession::continue_current(store) {
        Some(session) => Ok(session),
        None => bail!("No recipe in progress. Start one with `cook --recipe-file <file>`."),
    }
}

fn print_position(session: &CookingSession<JsonFileStore>) {
    let document = session.document();
    let total = session.steps().len();
    println!("🍲 {}  [{}]", document.title, session.language());

    if total == 0 {
        let content = &session.recipe().content;
        if recipe_parser::language_content(content, session.language()).is_none() {
            println!("❌ This recipe is not available in the selected language.");
        } else {
            println!("No instructions found in this recipe.");
        }
        return;
    }

    println!(
        "Step {}/{}: {}",
        session.current_step() + 1,
        total,
        session.current_instruction().unwrap_or_default()
    );
    if let Some(minutes) = session.current_instruction().and_then(step_minutes) {
        println!("   (suggested timer: {} min, run `timer`)", minutes);
    }
    if session.is_completed() {
        println!("✅ Recipe completed! Run `restart` to cook it again.");
    }
}

async fn report_sync(
    session: &mut CookingSession<JsonFileStore>,
    api: &ApiClient,
    transition: Transition,
) -> Result<()> {
    if let Some(SyncOutcome::Failed { notice }) = sync_transition(session, api, transition).await? {
        notify(&notice);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = parse_args();
    let mut config = AppConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(store_path) = cli.store {
        config.store_path = store_path;
    }
    tracing::debug!(?config, "configuration loaded");

    let mut store = JsonFileStore::new(&config.store_path);
    let api = ApiClient::new(&config.api_url).with_token(store.get(&StorageKey::Token));

    match cli.command {
        Command::Parse { recipe_file, lang, json } => {
            let raw = read_recipe(&recipe_file).await?;
            let document = recipe_parser::parse(&raw, lang);
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("{:#?}", document);
            }
        }
        Command::Login { email, password } => {
            match api.login(&Credentials { email, password }).await {
                Ok(token) => {
                    store.set(&StorageKey::Token, token)?;
                    println!("Logged in.");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "login failed");
                    notify("Invalid credentials");
                }
            }
        }
        Command::Signup { name, email, password } => {
            let request = SignupRequest {
                name,
                email,
                password,
            };
            match api.signup(&request).await {
                Ok(()) => {
                    println!("User registered successfully! Please login with your credentials.")
                }
                Err(e) => notify(&format!("Signup failed: {}", e)),
            }
        }
        Command::GoogleLogin { id_token } => match api.google_login(&id_token).await {
            Ok(token) => {
                store.set(&StorageKey::Token, token)?;
                println!("Logged in.");
            }
            Err(e) => {
                tracing::debug!(error = %e, "google login failed");
                notify("Google login failed");
            }
        },
        Command::Logout => {
            store.remove(&StorageKey::Token)?;
            println!("Logged out.");
        }
        Command::Detect { image } => {
            let bytes = fs::read(&image)
                .await
                .with_context(|| format!("Failed to read image '{}'", image.display()))?;
            let file_name = image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image.jpg".to_string());
            match api.detect(bytes, &file_name).await {
                Ok(detections) if detections.is_empty() => println!("No vegetables detected."),
                Ok(detections) => {
                    for detection in detections {
                        println!("🥕 {} ({:.0}%)", detection.label, detection.confidence * 100.0);
                    }
                }
                Err(e) => notify(&describe_api_error(&e, "Failed to detect vegetables")),
            }
        }
        Command::Generate { ingredients, preferences, out } => {
            let detections: Vec<_> = ingredients
                .into_iter()
                .map(|label| recipe_companion::api_connection::endpoints::Detection {
                    label: label.trim().to_string(),
                    confidence: 1.0,
                })
                .collect();
            let mut throttle = GenerationThrottle::new();
            match generate_from_detections(&api, &mut throttle, &detections, &preferences).await {
                Ok(recipe) => {
                    if let Some(out) = out {
                        fs::write(&out, &recipe)
                            .await
                            .with_context(|| format!("Failed to write '{}'", out.display()))?;
                        println!("Recipe written to {}", out.display());
                    } else {
                        println!("{}", recipe);
                    }
                }
                Err(e) => notify(&format!("Failed to generate recipe: {}", e)),
            }
        }
        Command::Save { recipe_file, lang } => {
            let raw = read_recipe(&recipe_file).await?;
            let mut saved = match api.user_recipes().await {
                Ok(saved) => saved,
                Err(e) => {
                    tracing::debug!(error = %e, "could not load saved recipes");
                    Vec::new()
                }
            };
            match save_if_new(&api, &mut saved, &raw, lang).await {
                Ok(SaveOutcome::Saved(recipe)) => {
                    println!("✅ Recipe saved to your collection: {}", recipe.title)
                }
                Ok(SaveOutcome::AlreadySaved) => println!("Recipe already saved!"),
                Err(e) => notify(&describe_api_error(&e, "Failed to save recipe")),
            }
        }
        Command::Recipes => match api.user_recipes().await {
            Ok(recipes) => {
                for recipe in recipes {
                    println!("{}  {}", recipe.id.as_deref().unwrap_or("-"), recipe.title);
                }
            }
            Err(e) => notify(&describe_api_error(&e, "Failed to fetch saved recipes")),
        },
        Command::DeleteRecipe { id } => match api.delete_recipe(&id).await {
            Ok(()) => println!("Recipe deleted."),
            Err(e) => notify(&describe_api_error(&e, "Failed to delete recipe")),
        },
        Command::Cook { recipe_file, title, lang, step } => {
            let raw = read_recipe(&recipe_file).await?;
            let recipe = recipe_from_text(&raw, title);
            let (mut session, transition) = CookingSession::begin(store, recipe, lang, step)?;
            report_sync(&mut session, &api, transition).await?;
            print_position(&session);
        }
        Command::Next => {
            let mut session = current_session(store)?;
            let transition = session.advance()?;
            report_sync(&mut session, &api, transition).await?;
            print_position(&session);
        }
        Command::Prev => {
            let mut session = current_session(store)?;
            let transition = session.retreat()?;
            report_sync(&mut session, &api, transition).await?;
            print_position(&session);
        }
        Command::Restart => {
            let mut session = current_session(store)?;
            let transition = session.restart()?;
            report_sync(&mut session, &api, transition).await?;
            print_position(&session);
        }
        Command::Lang { lang } => {
            let mut session = current_session(store)?;
            session.set_language(lang)?;
            print_position(&session);
        }
        Command::Status { speak } => {
            let session = current_session(store)?;
            print_position(&session);
            if speak {
                if let Some(step) = session.current_instruction() {
                    speak_step(&LogSpeaker, step, session.language());
                }
            }
        }
        Command::History => match api.cook_history().await {
            Ok(history) => {
                for record in history {
                    let point = recipe_companion::progress::resume(&store, &record.title);
                    let steps = recipe_parser::parse(&record.content, point.language).steps.len();
                    let status = if record.completed || point.is_completed(steps) {
                        "completed".to_string()
                    } else {
                        format!("step {}/{}", point.current_step + 1, steps.max(1))
                    };
                    println!("{}  {}  ({})", record.id, record.title, status);
                }
            }
            Err(e) => notify(&describe_api_error(&e, "Failed to load cook history")),
        },
        Command::Chat { message } => {
            let session = current_session(store)?;
            let mut chat = ChatSession::new();
            let context = StepContext::from_session(&session);
            if let Some(reply) = chat.send(&api, &message, &context).await {
                println!("🤖 {}", reply.content);
                for (idx, suggestion) in reply.suggestions.iter().enumerate() {
                    println!("   {}. {}", idx + 1, suggestion);
                }
            }
        }
        Command::Timer { minutes } => {
            let minutes = match minutes {
                Some(minutes) => minutes,
                None => {
                    let session = current_session(store)?;
                    match session.current_instruction().and_then(step_minutes) {
                        Some(minutes) => minutes,
                        None => bail!("The current step has no duration; pass --minutes."),
                    }
                }
            };
            let sink = ConsoleTimerSink {
                speaker: LogSpeaker,
            };
            let mut timer = StepTimer::new(Arc::new(sink));
            timer.start_minutes(minutes);
            timer.wait().await;
        }
    }

    Ok(())
}
