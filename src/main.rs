use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password, Select};
use tracing_subscriber::EnvFilter;

use souschef::orchestrator::ConversationOrchestrator;
use souschef::voice::{
    AudioCapture, PlaybackController, SpeechTranscriber, VoiceModelClient, VoiceModelOptions,
    VoiceSynthesizer,
};
use souschef::{
    AuthClient, AuthSession, ChatClient, Config, ImageSearch, IngredientScanner, Persona,
    PersonaLibrary, Profile, Recipe, RecipeGenerator, StoreClient, TurnOutcome,
};

/// Sous - voice-driven cooking assistant
#[derive(Parser)]
#[command(name = "sous", version, about)]
struct Cli {
    /// Chef persona to cook with (e.g. "gordon", "mario", "guy", "anthony")
    #[arg(short, long, env = "SOUS_CHEF")]
    chef: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate recipes from a list of ingredients
    Generate {
        /// Ingredients on hand, e.g. "chicken, rice, lemon"
        ingredients: String,
        /// What you feel like making
        #[arg(long)]
        dish: Option<String>,
        /// Save the picked recipe to your account
        #[arg(long)]
        save: bool,
    },
    /// Identify ingredients in a photo, then generate recipes
    Scan {
        /// Path to the photo (png, jpeg, or webp)
        image: PathBuf,
        /// What you feel like making
        #[arg(long)]
        dish: Option<String>,
        /// Save the picked recipe to your account
        #[arg(long)]
        save: bool,
    },
    /// Cook a saved recipe with the chef talking you through it
    Cook {
        /// Slug of the saved recipe (see `sous saved list`)
        slug: String,
    },
    /// Saved recipes
    Saved {
        #[command(subcommand)]
        command: SavedCommand,
    },
    /// Chef personas
    Chef {
        #[command(subcommand)]
        command: ChefCommand,
    },
    /// Create an account
    Signup {
        email: String,
    },
    /// Sign in to an existing account
    Login {
        email: String,
    },
    /// Sign out
    Logout,
    /// Update dietary preferences used during generation
    Prefs {
        /// Dietary restriction, e.g. "vegetarian"
        #[arg(long)]
        dietary: Option<String>,
        /// Allergies, e.g. "peanuts, shellfish"
        #[arg(long)]
        allergies: Option<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output in the chef's voice
    TestTts {
        /// Text to speak
        #[arg(default_value = "Right, let's get cooking! First, sharpen that knife.")]
        text: String,
    },
}

#[derive(Subcommand)]
enum SavedCommand {
    /// List saved recipes
    List,
    /// Rate a saved recipe from 1 to 5
    Rate { slug: String, rating: u8 },
}

#[derive(Subcommand)]
enum ChefCommand {
    /// List available chefs, built-in and custom
    List,
    /// Train a custom chef voice from a reference recording
    Create {
        /// Chef name
        name: String,
        /// Path to a WAV recording of the voice
        #[arg(long)]
        sample: PathBuf,
        /// Persona instructions; a generic chef prompt is used if omitted
        #[arg(long)]
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,souschef=info",
        1 => "info,souschef=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load();
    let chef_id = cli.chef.unwrap_or_else(|| config.chef.clone());

    match cli.command {
        Command::Generate {
            ingredients,
            dish,
            save,
        } => cmd_generate(&config, &ingredients, dish.as_deref(), save).await,
        Command::Scan { image, dish, save } => {
            cmd_scan(&config, &image, dish.as_deref(), save).await
        }
        Command::Cook { slug } => cmd_cook(&config, &chef_id, &slug).await,
        Command::Saved { command } => match command {
            SavedCommand::List => cmd_saved_list(&config).await,
            SavedCommand::Rate { slug, rating } => cmd_saved_rate(&config, &slug, rating).await,
        },
        Command::Chef { command } => match command {
            ChefCommand::List => cmd_chef_list(&config).await,
            ChefCommand::Create {
                name,
                sample,
                prompt,
            } => cmd_chef_create(&config, &name, &sample, prompt).await,
        },
        Command::Signup { email } => cmd_signup(&config, &email).await,
        Command::Login { email } => cmd_login(&config, &email).await,
        Command::Logout => cmd_logout(&config),
        Command::Prefs { dietary, allergies } => {
            cmd_prefs(&config, dietary.as_deref(), allergies.as_deref()).await
        }
        Command::TestMic { duration } => test_mic(&config, duration).await,
        Command::TestTts { text } => test_tts(&config, &chef_id, &text).await,
    }
}

/// Required API key, or a config error naming what to set
fn require(key: Option<&str>, what: &str) -> anyhow::Result<String> {
    key.map(ToString::to_string)
        .ok_or_else(|| anyhow::anyhow!("{what} not configured (set it in config.toml or env)"))
}

fn auth_client(config: &Config) -> anyhow::Result<AuthClient> {
    let api_key = require(config.firebase.api_key.as_deref(), "Firebase API key")?;
    Ok(AuthClient::new(
        api_key,
        &config.data_dir,
        config.request_timeout,
    )?)
}

fn store_client(config: &Config) -> anyhow::Result<StoreClient> {
    let project_id = require(config.firebase.project_id.as_deref(), "Firebase project id")?;
    Ok(StoreClient::new(project_id, config.request_timeout)?)
}

/// Persisted session, or an error telling the user to log in
fn require_session(config: &Config) -> anyhow::Result<AuthSession> {
    auth_client(config)?
        .current_session()?
        .ok_or_else(|| anyhow::anyhow!("not signed in (run `sous login <email>` first)"))
}

fn chat_client(config: &Config) -> anyhow::Result<ChatClient> {
    let api_key = require(config.api_keys.openai.as_deref(), "OpenAI API key")?;
    Ok(ChatClient::new(
        api_key,
        config.voice.llm_model.clone(),
        config.request_timeout,
    )?)
}

fn image_search(config: &Config) -> Option<ImageSearch> {
    let api_key = config.api_keys.spoonacular.clone()?;
    ImageSearch::new(api_key, config.request_timeout)
        .map_err(|e| tracing::warn!(error = %e, "image search unavailable"))
        .ok()
}

/// Chef library with any saved custom chefs merged in
#[allow(clippy::future_not_send)]
async fn load_chefs(config: &Config) -> PersonaLibrary {
    let mut library = PersonaLibrary::new();

    let session = auth_client(config)
        .ok()
        .and_then(|auth| auth.current_session().ok().flatten());
    if let Some(session) = session {
        match store_client(config) {
            Ok(store) => match store.list_chefs(&session).await {
                Ok(custom) => library.merge_custom(custom),
                Err(e) => tracing::warn!(error = %e, "could not load custom chefs"),
            },
            Err(e) => tracing::warn!(error = %e, "could not load custom chefs"),
        }
    }

    library
}

/// Signed-in profile for dietary-aware generation, when available
#[allow(clippy::future_not_send)]
async fn load_profile(config: &Config) -> Option<Profile> {
    let session = auth_client(config).ok()?.current_session().ok()??;
    let store = store_client(config).ok()?;
    match store.get_profile(&session).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "could not load profile");
            None
        }
    }
}

#[allow(clippy::future_not_send)]
async fn cmd_generate(
    config: &Config,
    ingredients: &str,
    dish: Option<&str>,
    save: bool,
) -> anyhow::Result<()> {
    let chat = chat_client(config)?;
    let images = image_search(config);
    let generator = RecipeGenerator::new(&chat, images.as_ref());
    let profile = load_profile(config).await;

    println!("Generating recipes...");
    let recipes = generator.generate(ingredients, dish, profile.as_ref()).await?;

    if recipes.is_empty() {
        println!("No recipes came back. Try different ingredients.");
        return Ok(());
    }

    let picked = pick_recipe(&recipes)?;
    print_recipe(picked);

    if save {
        let session = require_session(config)?;
        store_client(config)?.save_recipe(&session, picked).await?;
        println!("\nSaved as \"{}\".", picked.slug());
    }

    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_scan(
    config: &Config,
    image: &Path,
    dish: Option<&str>,
    save: bool,
) -> anyhow::Result<()> {
    let mime_type = match image.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        other => anyhow::bail!("unsupported image type: {other:?} (png, jpeg, or webp)"),
    };

    let bytes = std::fs::read(image)?;
    let chat = chat_client(config)?;
    let scanner = IngredientScanner::new(&chat);

    println!("Scanning photo for ingredients...");
    let ingredients = scanner.scan(&bytes, mime_type).await?;

    if ingredients.is_empty() {
        println!("No ingredients recognized in the photo.");
        return Ok(());
    }

    println!("Found: {}", ingredients.join(", "));
    cmd_generate(config, &ingredients.join(", "), dish, save).await
}

#[allow(clippy::future_not_send)]
async fn cmd_cook(config: &Config, chef_id: &str, slug: &str) -> anyhow::Result<()> {
    let session = require_session(config)?;
    let store = store_client(config)?;

    let recipes = store.list_recipes(&session).await?;
    let recipe = recipes
        .iter()
        .find(|r| r.slug() == slug)
        .ok_or_else(|| anyhow::anyhow!("no saved recipe \"{slug}\" (run `sous saved list`)"))?;

    let library = load_chefs(config).await;
    let chef = library.resolve_named(chef_id)?.clone();

    let openai_key = require(config.api_keys.openai.as_deref(), "OpenAI API key")?;
    let fish_key = require(config.api_keys.fish_audio.as_deref(), "Fish Audio API key")?;

    let mut orchestrator = ConversationOrchestrator::new(
        AudioCapture::new(&config.cache_dir),
        SpeechTranscriber::new(
            openai_key.clone(),
            config.voice.stt_model.clone(),
            config.request_timeout,
        )?,
        ChatClient::new(
            openai_key,
            config.voice.llm_model.clone(),
            config.request_timeout,
        )?,
        VoiceSynthesizer::new(
            fish_key,
            config.voice.tts_format.clone(),
            &config.cache_dir,
            config.request_timeout,
        )?,
        PlaybackController::new(),
    );

    println!("Cooking \"{}\" with {}.\n", recipe.title, chef.name);

    let mut step_index = 0usize;
    loop {
        let ctx = recipe.context_at(step_index);
        println!(
            "\nStep {}/{}: {}",
            ctx.step_index + 1,
            recipe.steps.len(),
            ctx.current_step()
        );

        let choices = &[
            "Next step",
            "Previous step",
            "Hear this step",
            "Ask the chef",
            "Finish cooking",
        ];
        let choice = Select::new().items(choices).default(0).interact()?;

        match choice {
            0 => {
                if step_index + 1 < recipe.steps.len() {
                    step_index += 1;
                } else {
                    println!("That was the last step. Enjoy!");
                    break;
                }
            }
            1 => step_index = step_index.saturating_sub(1),
            2 => {
                if let Err(e) = orchestrator.narrate_step(&chef, &ctx).await {
                    println!("Could not narrate that step: {e}");
                }
            }
            3 => ask_chef(&mut orchestrator, &chef, &ctx).await,
            _ => break,
        }
    }

    Ok(())
}

/// One press-and-hold question, emulated with Enter to start and stop
#[allow(clippy::future_not_send)]
async fn ask_chef(
    orchestrator: &mut ConversationOrchestrator<
        AudioCapture,
        SpeechTranscriber,
        ChatClient,
        VoiceSynthesizer,
        PlaybackController,
    >,
    chef: &Persona,
    ctx: &souschef::RecipeContext,
) {
    let _: String = Input::new()
        .with_prompt("Press Enter to start recording")
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default();

    match orchestrator.press() {
        Ok(true) => {}
        Ok(false) => {
            println!("Still busy with the last question.");
            return;
        }
        Err(e) => {
            println!("Could not start recording: {e}");
            return;
        }
    }

    let _: String = Input::new()
        .with_prompt("Recording... press Enter to stop")
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default();

    match orchestrator.release(chef, ctx).await {
        Ok(TurnOutcome::Played { transcript, reply }) => {
            println!("You asked: {transcript}");
            println!("{}: {reply}", chef.name);
        }
        Ok(TurnOutcome::NothingSaid) => println!("Didn't catch anything."),
        Ok(TurnOutcome::NoReply) => println!("{} had nothing to say. Try again.", chef.name),
        Ok(TurnOutcome::NoClip) => {}
        Err(e) => println!("That didn't work: {e}"),
    }
}

#[allow(clippy::future_not_send)]
async fn cmd_saved_list(config: &Config) -> anyhow::Result<()> {
    let session = require_session(config)?;
    let recipes = store_client(config)?.list_recipes(&session).await?;

    if recipes.is_empty() {
        println!("No saved recipes yet.");
        return Ok(());
    }

    for recipe in &recipes {
        let stars = recipe
            .rating
            .map_or_else(String::new, |r| format!(" [{}]", "*".repeat(r as usize)));
        println!("{}{stars}  {}", recipe.slug(), recipe.title);
    }
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_saved_rate(config: &Config, slug: &str, rating: u8) -> anyhow::Result<()> {
    let session = require_session(config)?;
    store_client(config)?.rate_recipe(&session, slug, rating).await?;
    println!("Rated \"{slug}\" {rating}/5.");
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_chef_list(config: &Config) -> anyhow::Result<()> {
    let library = load_chefs(config).await;
    for chef in library.iter() {
        println!("{}  ({})", chef.name, chef.id);
    }
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_chef_create(
    config: &Config,
    name: &str,
    sample: &Path,
    prompt: Option<String>,
) -> anyhow::Result<()> {
    let session = require_session(config)?;
    let fish_key = require(config.api_keys.fish_audio.as_deref(), "Fish Audio API key")?;

    let audio = std::fs::read(sample)?;
    let client = VoiceModelClient::new(fish_key, config.request_timeout)?;

    println!("Training voice model for {name}...");
    let voice_id = client
        .create(
            audio,
            &VoiceModelOptions {
                title: name.to_string(),
                ..VoiceModelOptions::default()
            },
        )
        .await?;

    let prompt = prompt.unwrap_or_else(|| {
        format!(
            "You are {name}, a friendly and encouraging chef. Answer cooking \
             questions briefly and practically, in your own voice."
        )
    });

    let chef = Persona::custom(voice_id.clone(), name.to_string(), voice_id, prompt);
    store_client(config)?.save_chef(&session, &chef).await?;

    println!("Chef {name} is ready. Cook with `sous --chef {name} cook <slug>`.");
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_signup(config: &Config, email: &str) -> anyhow::Result<()> {
    let password = Password::new().with_prompt("Password").interact()?;
    let auth = auth_client(config)?;
    let session = auth.sign_up(email, &password).await?;

    // Seed the profile document so preferences have somewhere to live
    let profile = Profile {
        email: Some(session.email.clone()),
        ..Profile::default()
    };
    if let Ok(store) = store_client(config) {
        if let Err(e) = store.create_profile(&session, &profile).await {
            tracing::warn!(error = %e, "could not create profile document");
        }
    }

    println!("Account created for {}.", session.email);
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_login(config: &Config, email: &str) -> anyhow::Result<()> {
    let password = Password::new().with_prompt("Password").interact()?;
    let session = auth_client(config)?.sign_in(email, &password).await?;
    println!("Signed in as {}.", session.email);
    Ok(())
}

fn cmd_logout(config: &Config) -> anyhow::Result<()> {
    auth_client(config)?.sign_out()?;
    println!("Signed out.");
    Ok(())
}

#[allow(clippy::future_not_send)]
async fn cmd_prefs(
    config: &Config,
    dietary: Option<&str>,
    allergies: Option<&str>,
) -> anyhow::Result<()> {
    if dietary.is_none() && allergies.is_none() {
        println!("Nothing to update (pass --dietary and/or --allergies).");
        return Ok(());
    }

    let session = require_session(config)?;
    store_client(config)?
        .update_preferences(&session, dietary, allergies)
        .await?;
    println!("Preferences updated.");
    Ok(())
}

/// Test microphone input by recording a short clip
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Recording for {duration} seconds... speak into your microphone!");

    let mut capture = AudioCapture::new(&config.cache_dir);
    capture.start()?;
    tokio::time::sleep(Duration::from_secs(duration)).await;

    match capture.stop()? {
        Some(clip) => {
            let size = std::fs::metadata(&clip.path).map(|m| m.len()).unwrap_or(0);
            println!("\nRecorded {}ms to {}", clip.duration_ms, clip.path.display());
            println!("Clip size: {size} bytes");
            if size < 1024 {
                println!("That clip looks empty. Check your input device:");
                println!("  1. Run: pactl info | grep 'Default Source'");
                println!("  2. Run: arecord -l (to list devices)");
            } else {
                println!("Your mic is working!");
            }
        }
        None => println!("No clip recorded."),
    }
    Ok(())
}

/// Test TTS output in a chef's voice
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, chef_id: &str, text: &str) -> anyhow::Result<()> {
    let library = load_chefs(config).await;
    let chef = library.resolve_named(chef_id)?;
    let fish_key = require(config.api_keys.fish_audio.as_deref(), "Fish Audio API key")?;

    let synthesizer = VoiceSynthesizer::new(
        fish_key,
        config.voice.tts_format.clone(),
        &config.cache_dir,
        config.request_timeout,
    )?;

    println!("Synthesizing with {}...", chef.name);
    let path = synthesizer.synthesize_to_file(text, &chef.voice_id).await?;

    let mut playback = PlaybackController::new();
    playback.play_file(&path)?;
    while playback.is_playing() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    println!("If you heard {}, TTS is working!", chef.name);
    Ok(())
}

fn pick_recipe(recipes: &[Recipe]) -> anyhow::Result<&Recipe> {
    if recipes.len() == 1 {
        return Ok(&recipes[0]);
    }

    let titles: Vec<&str> = recipes.iter().map(|r| r.title.as_str()).collect();
    let picked = Select::new()
        .with_prompt("Pick a recipe")
        .items(&titles)
        .default(0)
        .interact()?;
    Ok(&recipes[picked])
}

fn print_recipe(recipe: &Recipe) {
    println!("\n{}", recipe.title);
    println!("{}\n", recipe.description);

    println!("Ingredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {ingredient}");
    }

    println!("\nSteps:");
    for (i, step) in recipe.steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }

    if let Some(url) = &recipe.image_url {
        println!("\nLooks like: {url}");
    }
}
