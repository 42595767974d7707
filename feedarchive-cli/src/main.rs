use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;

use feedarchive::auth::{self, JsonFileStore};
use feedarchive::diarize::DEFAULT_DIARIZE_COMMAND;
use feedarchive::{
    dates, ArchiveClient, Credential, CredentialStore, DateSpec, Diarizer, DownloadOptions, Error,
    RttmDiarizer, TranscribeOptions, WhisperModel, WhisperTranscriber,
};

const USERNAME_VAR: &str = "FEEDARCHIVE_USERNAME";
const PASSWORD_VAR: &str = "FEEDARCHIVE_PASSWORD";

/// Dates to sweep when no date, range, or past-days mode is given.
const FULL_SWEEP_DAYS: u64 = 365;

#[derive(Parser)]
#[command(
    name = "feedarchive",
    version,
    about = "Download and transcribe radio-scanner feed archives"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download archives by feed id and date
    Download(DownloadArgs),
    /// Transcribe a directory of audio files
    Transcribe(TranscribeArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Feed id on the archive site.
    #[arg(short = 'i', long)]
    feed_id: String,

    /// Single date, YYYY/MM/DD.
    #[arg(short, long, conflicts_with_all = ["range", "past_days"])]
    date: Option<String>,

    /// Date range, YYYY/MM/DD-YYYY/MM/DD.
    #[arg(short, long, conflicts_with = "past_days")]
    range: Option<String>,

    /// Download archives from the past N days.
    #[arg(short, long)]
    past_days: Option<u64>,

    /// Combine each day's files into a single file.
    #[arg(long)]
    combine: bool,

    /// Transcribe downloaded files once all dates have finished.
    #[arg(short, long)]
    transcribe: bool,

    /// Concurrent downloads within one day's batch.
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Output directory for downloaded files.
    #[arg(short, long, default_value = "archives")]
    output_dir: PathBuf,

    #[command(flatten)]
    stt: SttArgs,
}

#[derive(Args)]
struct TranscribeArgs {
    /// Directory containing audio files.
    #[arg(short, long)]
    directory: PathBuf,

    #[command(flatten)]
    stt: SttArgs,
}

#[derive(Args)]
struct SttArgs {
    /// Use GPU for transcription.
    #[arg(long)]
    gpu: bool,

    /// Whisper model name, or a path to a ggml file.
    #[arg(long, default_value = "large-v3-turbo")]
    model: String,

    /// Diarization helper command (takes an audio path, prints RTTM).
    #[arg(long, default_value = DEFAULT_DIARIZE_COMMAND)]
    diarize_cmd: String,

    /// Skip speaker diarization.
    #[arg(long)]
    no_diarize: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("feedarchive=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Download(args) => run_download(args).await,
        Command::Transcribe(args) => run_transcribe(args).await,
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run_download(args: DownloadArgs) -> feedarchive::Result<()> {
    // Date mode, model name, and credentials must all resolve before any
    // archive I/O starts.
    let spec = date_spec(&args)?;
    let stt = args
        .transcribe
        .then(|| build_stt_options(&args.stt))
        .transpose()?;

    let credential = resolve_credential().await?;
    let client = ArchiveClient::new(credential)?;

    println!("Downloading archives for feed {}", args.feed_id.bold());

    let options = DownloadOptions::new()
        .output_dir(&args.output_dir)
        .jobs(args.jobs)
        .combine(args.combine);

    let date_dirs = feedarchive::download_feed(&client, &args.feed_id, &spec, &options).await?;

    println!(
        "{} {}",
        "Download complete:".green(),
        args.output_dir.join(&args.feed_id).display()
    );

    if let Some(stt_options) = stt {
        let (transcriber, diarizer) = build_stt(&args.stt, stt_options).await?;
        for dir in &date_dirs {
            println!("Transcribing audio in {}", dir.display());
            if let Err(e) = feedarchive::transcribe_directory(dir, &transcriber, diarizer_ref(&diarizer))
            {
                eprintln!("{} {e}", "Warning:".yellow().bold());
            }
        }
    }

    Ok(())
}

async fn run_transcribe(args: TranscribeArgs) -> feedarchive::Result<()> {
    let stt_options = build_stt_options(&args.stt)?;
    let (transcriber, diarizer) = build_stt(&args.stt, stt_options).await?;
    feedarchive::transcribe_directory(&args.directory, &transcriber, diarizer_ref(&diarizer))
}

/// Pick the date mode from the mutually-exclusive flags; with none given,
/// sweep the feed's whole retention window.
fn date_spec(args: &DownloadArgs) -> feedarchive::Result<DateSpec> {
    match (&args.date, &args.range, args.past_days) {
        (Some(date), _, _) => Ok(DateSpec::Single(dates::parse_date(date)?)),
        (_, Some(range), _) => dates::parse_range(range),
        (_, _, Some(days)) => Ok(DateSpec::PastDays(days)),
        _ => Ok(DateSpec::PastDays(FULL_SWEEP_DAYS)),
    }
}

/// Use the saved session if there is one, otherwise log in with the
/// credentials from the environment and save the session for next time.
async fn resolve_credential() -> feedarchive::Result<Credential> {
    let store = JsonFileStore::new(JsonFileStore::default_path());
    if let Some(credential) = store.load()? {
        return Ok(credential);
    }

    let missing = |var: &str| {
        Error::Auth(format!(
            "no saved session and {var} is not set — export {USERNAME_VAR} and {PASSWORD_VAR} to log in"
        ))
    };
    let username = std::env::var(USERNAME_VAR).map_err(|_| missing(USERNAME_VAR))?;
    let password = std::env::var(PASSWORD_VAR).map_err(|_| missing(PASSWORD_VAR))?;

    auth::ensure_credential(&store, &username, &password).await
}

fn build_stt_options(args: &SttArgs) -> feedarchive::Result<TranscribeOptions> {
    let model = match WhisperModel::parse_name(&args.model) {
        Some(model) => model,
        None => {
            let path = PathBuf::from(&args.model);
            if path.exists() {
                WhisperModel::Custom(path)
            } else {
                return Err(Error::Model(format!(
                    "unknown model {:?} — pass a known size or a path to a ggml file",
                    args.model
                )));
            }
        }
    };

    Ok(TranscribeOptions::new().model(model).gpu(args.gpu))
}

async fn build_stt(
    args: &SttArgs,
    options: TranscribeOptions,
) -> feedarchive::Result<(WhisperTranscriber, Option<RttmDiarizer>)> {
    let transcriber = WhisperTranscriber::new(&options).await?;
    let diarizer = (!args.no_diarize).then(|| RttmDiarizer::new(args.diarize_cmd.clone()));
    Ok((transcriber, diarizer))
}

fn diarizer_ref(diarizer: &Option<RttmDiarizer>) -> Option<&dyn Diarizer> {
    diarizer.as_ref().map(|d| d as &dyn Diarizer)
}
