use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate English text and synthesize the translation as speech
    Translate {
        /// English text to translate
        #[arg(short, long)]
        text: String,

        /// Target language display name (see `languages`)
        #[arg(short, long, default_value = "Spanish")]
        language: String,

        /// Print partial translations as they stream in
        #[arg(long)]
        stream: bool,

        /// Write the synthesized MP3 audio to this file
        #[arg(short, long)]
        audio_out: Option<PathBuf>,
    },

    /// Synthesize text directly, bypassing moderation and translation
    Speak {
        /// Text to synthesize, already in the target language
        #[arg(short, long)]
        text: String,

        /// Language whose voice to use
        #[arg(short, long, default_value = "Spanish")]
        language: String,

        /// Output MP3 file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Recognize speech from a WAV file
    Recognize {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Language spoken in the recording
        #[arg(short, long, default_value = "Spanish")]
        language: String,
    },

    /// List supported target languages and their voices
    Languages,
}
