//! Command-line interface for phonoscope
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Pronunciation analysis for spoken recordings
#[derive(Parser, Debug)]
#[command(
    name = "phonoscope",
    version,
    about = "Pronunciation analysis for spoken recordings"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging (-v: info, -vv: debug). RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline on a WAV file and print the report as JSON
    Analyze {
        /// WAV file to analyse, or '-' to read from stdin
        audio: PathBuf,

        /// Sentence the speaker was asked to say (default: use the transcript)
        #[arg(long, short = 'r', value_name = "TEXT")]
        reference: Option<String>,
    },

    /// Print the phoneme sequence for a piece of text
    Phonemes {
        /// Text to convert
        text: String,
    },

    /// Write the preprocessed (normalized, trimmed, pre-emphasized) audio
    Preprocess {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,
    },

    /// Word-level timestamps from the streaming recognizer, one JSON batch per line
    AlignWords {
        /// WAV file to align
        audio: PathBuf,

        /// Recognizer model directory (overrides word_alignment.model_path)
        #[arg(long, value_name = "DIR")]
        model: Option<PathBuf>,
    },

    /// Turn a score record into learner feedback
    Feedback {
        /// JSON score record produced by a scorer
        score: PathBuf,

        /// What the speaker actually said
        #[arg(long, value_name = "TEXT")]
        transcription: String,

        /// What the speaker was asked to say
        #[arg(long, value_name = "TEXT")]
        reference: String,

        /// Phoneme catalog JSON (default: data/phoneme_mapping.json)
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Also list practice suggestions for the weakest phonemes
        #[arg(long)]
        suggestions: bool,

        /// Print the feedback as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
