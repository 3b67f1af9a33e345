use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use rina_core::config::config_file_path;
use rina_core::face::{ActionUnitFrame, BlendshapeCategory, FacialClassifier};
use rina_core::vocal::{EmotionFrame, EmotionScore};
use rina_core::voice::{
    CommandRecognizer, RecognizerDriver, RecognizerEvent, RecognizerInput, TranscriptFragment,
    detect_wake_word,
};
use rina_core::{Config, Session, SessionEvent};

/// Rina - Expression and voice command engine for the character board
#[derive(Parser)]
#[command(name = "rina", version, about)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, env = "RINA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one action-unit frame (JSON map or category list)
    Face {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Classify one emotion frame (JSON map or score list)
    Vocal {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Check a transcript for the wake word
    Wake {
        transcript: String,
    },
    /// Match a transcript against the command table
    Match {
        transcript: String,
        /// Minimum confidence (defaults to the configured value)
        #[arg(long)]
        min_confidence: Option<f32>,
    },
    /// Replay a JSON Lines session log
    ///
    /// A command window still open at the end of the log is reported as
    /// timed out at its deadline.
    Replay {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Recognize commands from transcript lines on stdin
    Listen,
    /// Print the resolved configuration
    Config,
}

/// Action-unit input in either detector or map form
#[derive(Deserialize)]
#[serde(untagged)]
enum FaceInput {
    Categories(Vec<BlendshapeCategory>),
    Frame(ActionUnitFrame),
}

/// Emotion input in either service or map form
#[derive(Deserialize)]
#[serde(untagged)]
enum VocalInput {
    Scores(Vec<EmotionScore>),
    Frame(EmotionFrame),
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    path: Option<PathBuf>,
    config: &'a Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,rina_core=info",
        1 => "info,rina_core=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Face { input } => cmd_face(&config, &input),
        Command::Vocal { input } => cmd_vocal(&config, &input),
        Command::Wake { transcript } => {
            print_json(&detect_wake_word(&transcript, &config.wake_word))
        }
        Command::Match {
            transcript,
            min_confidence,
        } => {
            let min = min_confidence.unwrap_or(config.commands.min_confidence);
            let found = config.commands.table.match_command(&transcript, min);
            print_json(&found)
        }
        Command::Replay { input } => cmd_replay(&config, &input),
        Command::Listen => cmd_listen(&config).await,
        Command::Config => print_json(&ConfigReport {
            path: config_file_path(),
            config: &config,
        }),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::load()?),
    }
}

fn cmd_face(config: &Config, input: &str) -> anyhow::Result<()> {
    let frame = match serde_json::from_str(&read_input(input)?).context("invalid face input")? {
        FaceInput::Categories(categories) => ActionUnitFrame::from_categories(&categories),
        FaceInput::Frame(frame) => frame,
    };
    let classifier = FacialClassifier::new(config.face.min_confidence);
    print_json(&classifier.classify(&frame))
}

fn cmd_vocal(config: &Config, input: &str) -> anyhow::Result<()> {
    let frame = match serde_json::from_str(&read_input(input)?).context("invalid vocal input")? {
        VocalInput::Scores(scores) => EmotionFrame::from_scores(&scores),
        VocalInput::Frame(frame) => frame,
    };
    print_json(&config.vocal.classify(&frame))
}

fn cmd_replay(config: &Config, input: &str) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(std::io::stdin().lock())
    } else {
        let file = std::fs::File::open(input).with_context(|| format!("failed to open {input}"))?;
        Box::new(std::io::BufReader::new(file))
    };

    let mut session = Session::new(config);
    let mut count = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let event: SessionEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid event on line {}", index + 1))?;
        for output in session.process(event) {
            print_json(&output)?;
        }
        count += 1;
    }

    if let Some(output) = session.finish() {
        print_json(&output)?;
    }

    tracing::info!(
        events = count,
        expression = %session.pipeline().current(),
        "replay finished"
    );
    Ok(())
}

async fn cmd_listen(config: &Config) -> anyhow::Result<()> {
    let recognizer = CommandRecognizer::new(
        config.commands.table.clone(),
        config.wake_word.clone(),
        config.commands.min_confidence,
    );

    let (input_tx, input_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let driver = tokio::spawn(RecognizerDriver::new(recognizer).run(input_rx, event_tx));

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fragment = TranscriptFragment::new(line, true);
            if input_tx.send(RecognizerInput::Fragment(fragment)).await.is_err() {
                break;
            }
        }
        anyhow::Ok(())
    });

    tracing::info!("listening; one transcript per line, ctrl-d to stop");

    while let Some(event) = event_rx.recv().await {
        if let RecognizerEvent::Command(matched) = &event {
            if config.navigation.filter(&matched.action).is_none() {
                continue;
            }
        }
        print_json(&event)?;
    }

    reader.await??;
    let recognizer = driver.await?;
    tracing::debug!(state = %recognizer.state(), "recognizer stopped");
    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
