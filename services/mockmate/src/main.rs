mod audio_io;
mod config;
mod export;
mod render;
mod repl;

use crate::audio_io::HostMicrophone;
use crate::config::Config;
use crate::repl::ReplCommand;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mockmate_core::resume::load_resume;
use mockmate_core::{
    AudioCaptureController, HttpTurnProtocol, InterviewSession, SessionError, SessionPhase,
    TurnProtocol,
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Practice interviews against a MockMate service")]
struct Cli {
    /// Base URL of the interview service. Overrides MOCKMATE_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interview based on a resume
    Interview {
        /// Path to the resume (PDF)
        resume: PathBuf,
        /// Write the transcript and report to this file when the session ends
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List past interviews, newest first
    History,
    /// List audio input and output devices
    Devices,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    tracing::info!("Using interview service at {}", config.api_url);

    let protocol = HttpTurnProtocol::new(config.api_url.clone(), config.request_timeout)
        .context("Failed to build HTTP client")?;

    match args.command {
        Command::Interview { resume, save } => {
            run_interview(&config, protocol, &resume, save.as_deref()).await
        }
        Command::History => {
            let records = protocol
                .list_history()
                .await
                .context("Failed to fetch interview history")?;
            println!("{}", render::history(&records));
            Ok(())
        }
        Command::Devices => {
            println!("{}", audio_io::describe_devices()?);
            Ok(())
        }
    }
}

async fn run_interview(
    config: &Config,
    protocol: HttpTurnProtocol,
    resume_path: &Path,
    save: Option<&Path>,
) -> Result<()> {
    let resume = load_resume(&protocol, resume_path)
        .await
        .context("Failed to load resume")?;
    println!("Resume loaded. Connecting to your interviewer...");

    let session = InterviewSession::new(protocol, audio_io::playback(config));
    let mut capture: AudioCaptureController<HostMicrophone> =
        AudioCaptureController::new(audio_io::microphone(config));
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    session
        .begin(resume)
        .await
        .context("Failed to start the interview")?;
    print_latest_reply(&session);
    println!("{}\n", repl::HELP);

    loop {
        let line = tokio::select! {
            line = input.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Say(text) => match session.submit_text(&text).await {
                Ok(()) => print_latest_reply(&session),
                Err(e) => report_error(&e),
            },
            ReplCommand::Voice => {
                if let Err(e) = record_and_submit(&session, &mut capture, &mut input).await {
                    report_error(&e);
                }
            }
            ReplCommand::End => match session.conclude().await {
                Ok(()) => {
                    if let Some(report) = session.report() {
                        println!("\n{}", render::report(&report));
                    }
                    break;
                }
                Err(e) => report_error(&e),
            },
            ReplCommand::Transcript => {
                let state = session.snapshot();
                print!("{}", render::transcript(&state.transcript, &state.failed_turns));
            }
            ReplCommand::Help => println!("{}", repl::HELP),
            ReplCommand::Quit => break,
            ReplCommand::Empty => {}
            ReplCommand::Unknown(command) => println!("Unknown command {command}, try /help"),
        }
    }

    if session.phase() != SessionPhase::Feedback {
        println!("Interview ended without a report.");
    }
    if let Some(path) = save {
        export::save_session(&session.snapshot(), path).await?;
    }
    Ok(())
}

async fn record_and_submit<P: TurnProtocol>(
    session: &InterviewSession<P>,
    capture: &mut AudioCaptureController<HostMicrophone>,
    input: &mut Input,
) -> Result<(), SessionError> {
    if session.is_turn_in_flight() {
        return Err(SessionError::ConcurrentTurnRejected);
    }
    capture.start()?;
    println!("Recording... press Enter to stop.");
    if let Err(e) = input.next_line().await {
        tracing::warn!("Failed to read stop signal: {e}");
    }

    let Some(blob) = capture.stop()? else {
        return Ok(());
    };
    println!("Processing your answer...");
    session.submit_audio(blob).await?;
    if let Some(you) = session.transcript().iter().rev().nth(1) {
        println!("{}", render::message(you));
    }
    print_latest_reply(session);
    Ok(())
}

fn print_latest_reply<P: TurnProtocol>(session: &InterviewSession<P>) {
    if let Some(reply) = session.transcript().last() {
        println!("\n{}\n", render::message(reply));
    }
}

fn report_error(err: &SessionError) {
    if err.is_silent() {
        tracing::debug!("Ignored: {err}");
        return;
    }
    tracing::error!("{}", render::error(err));
    if err.is_network() {
        println!("Could not reach the interview service. Try again.");
    } else {
        println!("{}", render::error(err));
    }
}
