use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use voice_fetch::assistant::{Assistant, StopSignal};
use voice_fetch::backends::dog_ceo::DogCeoCatalog;
use voice_fetch::backends::espeak::EspeakBackend;
use voice_fetch::backends::system::{FileStorage, SystemViewer};
use voice_fetch::backends::vosk::{VoskModelProvisioner, VoskRecognizer};
use voice_fetch::backends::wikipedia::WikipediaClient;
use voice_fetch::backends::{self, ModelProvisioner, SpeechSynth};
use voice_fetch::config_loader::Settings;
use voice_fetch::dispatcher::CommandDispatcher;
use voice_fetch::ear::{AudioSource, CpalSource, WavSource};
use voice_fetch::engine::{AudioEngine, SilentSynth};
use voice_fetch::intent::IntentClassifier;
use voice_fetch::narrator::Narrator;
use voice_fetch::{Error, Result};

/// Voice assistant that fetches, shows, saves and describes dog pictures
#[derive(Parser)]
#[command(name = "voice-fetch", version, about)]
struct Cli {
    /// Replay a 16-bit PCM WAV file instead of listening to the microphone
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Print responses without speaking them
    #[arg(long)]
    mute: bool,

    /// Language to listen and answer in ("en" or "ru")
    #[arg(short, long)]
    language: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for voice commands (default)
    Run,
    /// Print the command a phrase would trigger
    Classify {
        /// Phrase as the recognizer would hear it
        text: String,
    },
    /// Download the speech model if it is missing, then exit
    Provision,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "warn,voice_fetch=info",
        1 => "info,voice_fetch=debug",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::new()?;
    if let Some(language) = &cli.language {
        settings.language = language.clone();
        settings.validate()?;
    }
    if cli.mute {
        settings.enable_audio = false;
    }
    tracing::debug!(?settings, "loaded configuration");
    Ok(settings)
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Classify { text } => {
            let intent = IntentClassifier::new(settings.locale().triggers()).classify(&text);
            println!("{}", intent);
            Ok(())
        }
        Command::Provision => join(tokio::task::spawn_blocking(move || provision(&settings)).await),
        Command::Run => listen(settings, cli.wav).await,
    }
}

fn join(res: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match res {
        Ok(result) => result,
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

fn provision(settings: &Settings) -> Result<()> {
    let client = backends::http_client(&settings.user_agent, settings.http_timeout_secs)?;
    VoskModelProvisioner::new(settings.model_url(), client).ensure_available(&settings.model_path())
}

async fn listen(settings: Settings, wav: Option<PathBuf>) -> Result<()> {
    let stop = StopSignal::new();
    let loop_stop = stop.clone();
    let worker = tokio::task::spawn_blocking(move || run_assistant(settings, wav, loop_stop));
    supervise(worker, tokio::signal::ctrl_c(), stop).await
}

// Waits for the loop; an interrupt raises `stop` and the loop winds down on its own.
async fn supervise<F>(
    mut worker: tokio::task::JoinHandle<Result<()>>,
    interrupt: F,
    stop: StopSignal,
) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        res = &mut worker => return join(res),
        signal = interrupt => match signal {
            Ok(()) => {
                tracing::info!("interrupt received, stopping after the current command");
                stop.raise();
            }
            // Keep running without interrupt handling
            Err(e) => tracing::warn!(error = %e, "cannot listen for ctrl-c"),
        }
    }

    join(worker.await)
}

fn speech_engine(settings: &Settings) -> Box<dyn SpeechSynth> {
    if settings.enable_audio {
        Box::new(AudioEngine::new(EspeakBackend::new(
            settings.espeak_voice(),
            settings.speech_rate,
            Duration::from_secs(settings.tts_timeout_secs),
        )))
    } else {
        Box::new(SilentSynth)
    }
}

// Runs on a blocking thread: the cpal stream and the vosk recognizer stay here.
fn run_assistant(settings: Settings, wav: Option<PathBuf>, stop: StopSignal) -> Result<()> {
    let locale = settings.locale();
    let client = backends::http_client(&settings.user_agent, settings.http_timeout_secs)?;
    let narrator = Narrator::new(speech_engine(&settings));

    let model_path = settings.model_path();
    if !model_path.exists() {
        narrator.announce(locale.model_missing());
    }
    VoskModelProvisioner::new(settings.model_url(), client.clone()).ensure_available(&model_path)?;

    let mut source: Box<dyn AudioSource> = match wav {
        Some(path) => Box::new(WavSource::new(path, settings.frame_samples)),
        None => Box::new(CpalSource::new(
            settings.sample_rate,
            settings.frame_samples,
            stop.clone(),
        )),
    };
    source.open()?;
    if source.sample_rate() == 0 {
        return Err(Error::Audio("audio source reported no sample rate".to_string()));
    }
    let recognizer = VoskRecognizer::new(&model_path, source.sample_rate())?;

    let dispatcher = CommandDispatcher::new(
        locale,
        Box::new(DogCeoCatalog::new(settings.catalog_url.clone(), client.clone())),
        Box::new(SystemViewer::new()),
        Box::new(FileStorage::new(&settings.save_dir)),
        Box::new(WikipediaClient::new(settings.wikipedia_base_url(), client)),
    )
    .with_summary_sentences(settings.summary_sentences);

    Assistant::new(source, recognizer, dispatcher, narrator, locale, stop).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    // Loop stand-in: runs until stopped, or gives up after `limit`
    fn worker(stop: StopSignal, limit: Duration) -> tokio::task::JoinHandle<Result<()>> {
        tokio::task::spawn_blocking(move || {
            let started = std::time::Instant::now();
            while !stop.is_raised() {
                if started.elapsed() >= limit {
                    return Ok(());
                }
                thread::sleep(Duration::from_millis(5));
            }
            Err(Error::Audio("stopped".to_string()))
        })
    }

    #[tokio::test]
    async fn test_interrupt_raises_stop() {
        let stop = StopSignal::new();
        let handle = worker(stop.clone(), Duration::from_secs(5));

        let res = supervise(handle, async { Ok(()) }, stop.clone()).await;

        assert!(stop.is_raised());
        assert!(matches!(res, Err(Error::Audio(_))));
    }

    #[tokio::test]
    async fn test_failed_interrupt_handler_keeps_loop_running() {
        let stop = StopSignal::new();
        let handle = worker(stop.clone(), Duration::from_millis(100));

        let interrupt = async { Err(std::io::Error::other("signal handler unavailable")) };
        let res = supervise(handle, interrupt, stop.clone()).await;

        assert!(!stop.is_raised());
        assert!(res.is_ok());
    }
}
