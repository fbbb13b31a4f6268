use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voice_pdf_assistant::config::{Config, EmbeddingBackend, Settings};
use voice_pdf_assistant::controller::{Controller, VoiceInput};
use voice_pdf_assistant::embedding::load_embedder;
use voice_pdf_assistant::json::to_ascii_pretty;
use voice_pdf_assistant::voice::scripted::Transcript;
use voice_pdf_assistant::voice::{check_model_dir, ConsoleSynthesizer, SpeechSynthesizer};
use voice_pdf_assistant::{console, extract, SimilarityRanker};

#[derive(Parser, Debug)]
#[command(name = "voice-pdf-assistant", about = "Ask a PDF questions by text or voice")]
struct Cli {
    /// Configuration file (defaults to voice-pdf-assistant.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    log_level: String,

    /// Use the offline hashing embedder instead of all-MiniLM-L6-v2
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print paragraphs, headings and mind-map as JSON
    Extract { pdf: PathBuf },
    /// Find the paragraph that best answers a question
    Ask {
        pdf: PathBuf,
        query: String,
        /// Also print the runner-up paragraphs
        #[arg(long, default_value_t = 1)]
        top: usize,
    },
    /// List the headings found in a PDF
    Headings { pdf: PathBuf },
    /// Show the heading mind-map
    Mindmap {
        pdf: PathBuf,
        /// Print Graphviz DOT instead of a text tree
        #[arg(long)]
        dot: bool,
    },
    /// Interactive session with optional voice input
    Session {
        pdf: Option<PathBuf>,
        /// Enable microphone input (needs the `voice` feature and a Vosk model)
        #[arg(long)]
        voice: bool,
        /// Replay recognized utterances from a file, one per line
        #[arg(long, value_name = "FILE", conflicts_with = "voice")]
        voice_script: Option<PathBuf>,
    },
}

fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    let mut settings = config.settings().context("Invalid configuration")?;
    if cli.offline {
        settings.embedding.backend = EmbeddingBackend::Hashing;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);
    let mut settings = load_settings(&cli)?;

    match &cli.command {
        Commands::Extract { pdf } => {
            let extraction = extract::extract(pdf, &settings.extract)
                .with_context(|| format!("Failed to extract {}", pdf.display()))?;
            println!("{}", to_ascii_pretty(&extraction)?);
        }
        Commands::Headings { pdf } => {
            let extraction = extract::extract(pdf, &settings.extract)
                .with_context(|| format!("Failed to extract {}", pdf.display()))?;
            println!("{}", extraction.mind_map.heading_lines());
        }
        Commands::Mindmap { pdf, dot } => {
            let extraction = extract::extract(pdf, &settings.extract)
                .with_context(|| format!("Failed to extract {}", pdf.display()))?;
            if *dot {
                print!("{}", extraction.mind_map.to_dot());
            } else {
                println!("{}", extraction.mind_map.render_tree());
            }
        }
        Commands::Ask { pdf, query, top } => {
            let extraction = extract::extract(pdf, &settings.extract)
                .with_context(|| format!("Failed to extract {}", pdf.display()))?;
            let embedder = load_embedder(&settings.embedding)?;
            let ranker = SimilarityRanker::new(embedder, &settings.rank);
            let ranked = ranker.score_all(query, &extraction.paragraphs)?;
            if ranked.is_empty() {
                println!("{}", voice_pdf_assistant::models::NO_MATCH_MESSAGE);
            }
            for hit in ranked.iter().take((*top).max(1)) {
                println!("[#{} score {:.4}]\n{}\n", hit.index + 1, hit.score, hit.text);
            }
        }
        Commands::Session {
            pdf,
            voice,
            voice_script,
        } => {
            settings.voice.enabled |= *voice;
            check_model_dir(&settings.voice).context("Speech recognition model is missing")?;

            let embedder = load_embedder(&settings.embedding)?;
            let ranker = SimilarityRanker::new(embedder, &settings.rank);
            let voice_input = voice_input(&settings, voice_script.as_deref())?;
            let synthesizer = synthesizer(&settings)?;

            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let controller = Controller::new(settings, ranker, synthesizer, voice_input, events_tx);
            info!("Starting interactive session");
            console::run(controller, events_rx, pdf.clone()).await?;
        }
    }

    Ok(())
}

fn voice_input(settings: &Settings, script: Option<&std::path::Path>) -> Result<Option<VoiceInput>> {
    if let Some(path) = script {
        let transcript = Transcript::load(path)
            .with_context(|| format!("Failed to read voice script {}", path.display()))?;
        let input: VoiceInput = Box::new(move || transcript.opener());
        return Ok(Some(input));
    }
    if !settings.voice.enabled {
        return Ok(None);
    }
    microphone_input(settings)
}

#[cfg(feature = "voice")]
fn microphone_input(settings: &Settings) -> Result<Option<VoiceInput>> {
    let voice = settings.voice.clone();
    let input: VoiceInput =
        Box::new(move || voice_pdf_assistant::voice::native::microphone_opener(&voice));
    Ok(Some(input))
}

#[cfg(not(feature = "voice"))]
fn microphone_input(_settings: &Settings) -> Result<Option<VoiceInput>> {
    anyhow::bail!("Microphone input requires building with `--features voice`")
}

#[cfg(feature = "voice")]
fn synthesizer(settings: &Settings) -> Result<Arc<dyn SpeechSynthesizer>> {
    match voice_pdf_assistant::voice::native::NativeSynthesizer::new(settings.voice.speech_rate) {
        Ok(native) => Ok(Arc::new(native)),
        Err(e) => {
            tracing::warn!("System speech unavailable ({}); echoing to the console", e);
            Ok(Arc::new(ConsoleSynthesizer::new()))
        }
    }
}

#[cfg(not(feature = "voice"))]
fn synthesizer(_settings: &Settings) -> Result<Arc<dyn SpeechSynthesizer>> {
    Ok(Arc::new(ConsoleSynthesizer::new()))
}
