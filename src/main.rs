//! Voxlate - Translate-and-Speak Workflow
//!
//! This is the main entry point for the Voxlate application: a pipeline that
//! safety-checks English text, streams a translation from a hosted LLM, and
//! synthesizes the translation as speech.

use std::io::Write;
use std::pin::pin;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use indicatif::ProgressBar;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use voxlate::cli::{Args, Commands};
use voxlate::config::Config;
use voxlate::error::VoxlateError;
use voxlate::language::{lookup_voice, SUPPORTED_LANGUAGES};
use voxlate::speech::{AudioFormat, RecognitionResult, SpeechClientFactory, SynthesisResult};
use voxlate::state::TranslationState;
use voxlate::workflow::{Stage, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Execute command
    match args.command {
        Commands::Translate { text, language, stream, audio_out } => {
            info!("Translating to {}", language);

            let workflow = Workflow::new(config)?;
            let final_state = if stream {
                run_streaming(&workflow, text, language).await?
            } else {
                run_blocking(&workflow, text, language).await
            };

            if final_state.has_error() {
                anyhow::bail!(
                    "Workflow failed: {}",
                    final_state.error_message.unwrap_or_default()
                );
            }

            if !stream {
                if let Some(translated) = &final_state.translated_text {
                    println!("{}", translated);
                }
            }

            if let Some(audio) = &final_state.audio_bytes {
                match audio_out {
                    Some(path) => {
                        std::fs::write(&path, audio)?;
                        println!("Audio written to {} ({} bytes)", path.display(), audio.len());
                    }
                    None => {
                        println!(
                            "Synthesized {} bytes of audio (use --audio-out to save)",
                            audio.len()
                        );
                    }
                }
            }
        }
        Commands::Speak { text, language, output } => {
            info!("Synthesizing text in {}", language);

            let voice = lookup_voice(&language)
                .ok_or_else(|| VoxlateError::UnsupportedLanguage(language.clone()))?;
            let speech = SpeechClientFactory::create(config.speech)?;

            match speech
                .synthesize_to_bytes(&text, voice.voice, AudioFormat::Mp3Mono16Khz32Kbps)
                .await?
            {
                SynthesisResult::Completed { audio } => {
                    std::fs::write(&output, &audio)?;
                    println!("Audio written to {} ({} bytes)", output.display(), audio.len());
                }
                SynthesisResult::Canceled { reason, error_detail } => {
                    let detail = error_detail
                        .map(|d| format!(" - Error details: {}", d))
                        .unwrap_or_default();
                    anyhow::bail!("Speech synthesis canceled: {}{}", reason, detail);
                }
                SynthesisResult::Other { reason } => {
                    anyhow::bail!("Speech synthesis failed with unexpected reason: {}", reason);
                }
            }
        }
        Commands::Recognize { input, language } => {
            info!("Recognizing speech from: {}", input.display());

            let voice = lookup_voice(&language)
                .ok_or_else(|| VoxlateError::UnsupportedLanguage(language.clone()))?;
            let speech = SpeechClientFactory::create(config.speech)?;

            match speech.recognize_from_file(&input, voice.locale).await? {
                RecognitionResult::Recognized { text } => println!("{}", text),
                RecognitionResult::NoMatch => {
                    anyhow::bail!("No speech could be recognized from the audio");
                }
                RecognitionResult::Canceled { reason, error_detail } => {
                    let detail = error_detail
                        .map(|d| format!(" - Error details: {}", d))
                        .unwrap_or_default();
                    anyhow::bail!("Speech recognition canceled: {}{}", reason, detail);
                }
                RecognitionResult::Other { reason } => {
                    anyhow::bail!("Speech recognition failed with unexpected reason: {}", reason);
                }
            }
        }
        Commands::Languages => {
            println!("{:<12} {:<8} {:<24}", "Language", "Locale", "Voice");
            println!("{}", "-".repeat(46));
            for language in SUPPORTED_LANGUAGES {
                println!(
                    "{:<12} {:<8} {:<24}",
                    language.name, language.locale, language.voice
                );
            }
        }
    }

    Ok(())
}

/// Run the pipeline to completion behind a spinner.
async fn run_blocking(workflow: &Workflow, text: String, language: String) -> TranslationState {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Translating to {}...", language));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let state = workflow.run(text, language).await;

    spinner.finish_and_clear();
    state
}

/// Run the pipeline incrementally, printing translation fragments as they
/// arrive. Each event carries a cumulative prefix, so only the unseen suffix
/// is printed.
async fn run_streaming(
    workflow: &Workflow,
    text: String,
    language: String,
) -> Result<TranslationState> {
    let mut final_state = TranslationState::new(text.as_str(), language.as_str());
    let events = workflow.stream(text, language);
    let mut events = pin!(events);

    let mut printed = 0usize;
    while let Some(event) = events.next().await {
        if event.stage == Stage::Translate {
            if let Some(translated) = &event.state.translated_text {
                if translated.len() > printed {
                    print!("{}", &translated[printed..]);
                    std::io::stdout().flush()?;
                    printed = translated.len();
                }
            }
        }
        final_state = event.state;
    }

    if printed > 0 {
        println!();
    }

    Ok(final_state)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let voxlate_dir = std::env::current_dir()?.join(".voxlate");
    let log_dir = voxlate_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "voxlate.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
