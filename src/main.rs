use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use phonoscope::align::WordAligner;
use phonoscope::audio::{AudioInput, AudioPreprocessor};
use phonoscope::cli::{Cli, Commands, ConfigAction};
use phonoscope::config::{Config, G2pConfig};
use phonoscope::defaults;
use phonoscope::feedback::{
    PhonemeCatalog, ScoreRecord, format_feedback, generate_feedback, improvement_suggestions,
};
use phonoscope::phoneme::lexicon::ensure_lexicon;
use phonoscope::phoneme::{LexiconG2p, to_phonemes};
use phonoscope::pipeline::{PipelineFailure, PipelineOrchestrator, PipelineOutcome, PipelineReport};
use phonoscope::registry::EngineRegistry;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze { audio, reference } => {
            let config = load_config(cli.config.as_deref())?;
            if !run_analyze(&config, &audio, reference.as_deref())? {
                std::process::exit(1);
            }
        }
        Commands::Phonemes { text } => {
            let config = load_config(cli.config.as_deref())?;
            run_phonemes(&config, &text)?;
        }
        Commands::Preprocess { input, output } => {
            let config = load_config(cli.config.as_deref())?;
            run_preprocess(&config, &input, &output)?;
        }
        Commands::AlignWords { audio, model } => {
            let config = load_config(cli.config.as_deref())?;
            run_align_words(&config, &audio, model)?;
        }
        Commands::Feedback {
            score,
            transcription,
            reference,
            catalog,
            suggestions,
            json,
        } => {
            run_feedback(
                &score,
                &transcription,
                &reference,
                catalog.as_deref(),
                suggestions,
                json,
            )?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "phonoscope",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "phonoscope=warn",
        1 => "phonoscope=info",
        _ => "phonoscope=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/phonoscope/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path).with_context(|| format!("failed to load config from {}", path.display()))?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Run the pipeline and print its report. Returns whether the run succeeded.
fn run_analyze(config: &Config, audio: &Path, reference: Option<&str>) -> Result<bool> {
    if let Some(failed) = prefetch_lexicon(&config.g2p, std::io::stderr().is_terminal()) {
        return print_report(&failed);
    }

    let registry = Arc::new(EngineRegistry::from_config(config));
    let pipeline = PipelineOrchestrator::new(config, registry)?;

    let input = if audio == Path::new("-") {
        AudioInput::from_reader(std::io::stdin())
    } else {
        AudioInput::from_path(audio)
    };

    print_report(&pipeline.run(input, reference))
}

/// Fetch the dictionary up front so the download shows progress. A failure
/// ends the run as a conversion failure; the engine registry never retries it.
fn prefetch_lexicon(config: &G2pConfig, progress: bool) -> Option<PipelineOutcome> {
    ensure_lexicon(config, progress).err().map(|e| {
        tracing::warn!(error = %e, "lexicon is not available");
        Err(PipelineFailure::from(&e))
    })
}

fn print_report(outcome: &PipelineOutcome) -> Result<bool> {
    println!("{}", PipelineReport::from(outcome).to_json()?);

    match outcome {
        Ok(result) => {
            eprintln!(
                "{} {} phonemes over {:.2}s",
                "✓".green(),
                result.phonemes.len(),
                result.audio_duration
            );
            Ok(true)
        }
        Err(failure) => {
            eprintln!("{} {}", "✗".red(), failure.message);
            Ok(false)
        }
    }
}

fn run_phonemes(config: &Config, text: &str) -> Result<()> {
    ensure_lexicon(&config.g2p, std::io::stderr().is_terminal())?;
    let engine = LexiconG2p::from_config(&config.g2p)?;
    let phonemes = to_phonemes(&engine, text)?;
    println!("{}", phonemes.join(" "));
    Ok(())
}

fn run_preprocess(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let preprocessor = AudioPreprocessor::new(config.audio.clone());
    let audio = preprocessor
        .process_to_file(AudioInput::from_path(input), output)
        .with_context(|| format!("failed to preprocess {}", input.display()))?;

    eprintln!(
        "{} Wrote {:.2}s of audio to {}",
        "✓".green(),
        audio.duration_secs(),
        output.display()
    );
    Ok(())
}

fn run_align_words(config: &Config, audio: &Path, model: Option<PathBuf>) -> Result<()> {
    let mut settings = config.word_alignment.clone();
    if let Some(model) = model {
        settings.model_path = model;
    }

    let aligner = WordAligner::from_config(&settings)?;
    let batches = aligner
        .align(audio)
        .with_context(|| format!("failed to align {}", audio.display()))?;

    for batch in &batches {
        println!("{}", serde_json::to_string(batch)?);
    }
    Ok(())
}

fn run_feedback(
    score_path: &Path,
    transcription: &str,
    reference: &str,
    catalog_path: Option<&Path>,
    with_suggestions: bool,
    json: bool,
) -> Result<()> {
    let contents = std::fs::read_to_string(score_path)
        .with_context(|| format!("failed to read {}", score_path.display()))?;
    let score: ScoreRecord = serde_json::from_str(&contents)
        .with_context(|| format!("invalid score record in {}", score_path.display()))?;

    let catalog_path = catalog_path.unwrap_or(Path::new(defaults::DEFAULT_PHONEME_CATALOG));
    let catalog = PhonemeCatalog::load(catalog_path)?;

    let feedback = generate_feedback(&score, transcription, reference, &catalog);
    let suggestions = if with_suggestions {
        improvement_suggestions(&score, &catalog)
    } else {
        Vec::new()
    };

    if json {
        let value = serde_json::json!({
            "feedback": feedback,
            "suggestions": suggestions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let formatted = format_feedback(&feedback);
    println!(
        "{} {} ({})",
        formatted.score_emoji,
        formatted.main_message.bold(),
        formatted.level
    );
    println!();
    println!("{}", formatted.detailed_feedback);

    if !suggestions.is_empty() {
        println!();
        println!("{}", "Practice suggestions:".bold());
        for suggestion in &suggestions {
            let mut line = format!("  {} ({:.1}/100)", suggestion.phoneme.cyan(), suggestion.score);
            if !suggestion.ipa.is_empty() {
                line.push_str(&format!(" /{}/", suggestion.ipa));
            }
            if !suggestion.description.is_empty() {
                line.push_str(&format!(" - {}", suggestion.description));
            }
            println!("{line}");
            if !suggestion.examples.is_empty() {
                println!("      e.g. {}", suggestion.examples.join(", "));
            }
            if !suggestion.tip.is_empty() {
                println!("      {}", suggestion.tip.dimmed());
            }
        }
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
