//! CLI entry point for the transcription client.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Load the persisted [`SessionStore`].
//! 4. Build the [`HttpApi`] from config.
//! 5. Create the tokio runtime and dispatch the subcommand.
//!
//! While a `transcribe` submission is in flight, Ctrl-C triggers
//! [`Coordinator::cancel`]: the local request is aborted immediately and,
//! when a job id is known, the server is asked to stop the job.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use transcribe_client::api::{ApiError, HttpApi};
use transcribe_client::config::AppConfig;
use transcribe_client::session::SessionStore;
use transcribe_client::submission::{
    Coordinator, Language, MediaFile, ModelSize, SubmissionInput, SubmissionOutcome, SubmitError,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "transcribe-client")]
#[command(about = "Submit audio/video for transcription and fetch the results")]
struct Cli {
    /// Override the backend base URL from settings.toml.
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login {
        /// Account name; the password is prompted on stdin.
        username: String,
    },

    /// Forget the persisted session.
    Logout,

    /// Submit files and/or a URL for transcription.  Ctrl-C cancels.
    Transcribe {
        /// Media files, transcribed in the given order (max 10).
        files: Vec<PathBuf>,

        /// Remote media URL to download and transcribe.
        #[arg(long)]
        url: Option<String>,

        /// Target language (english, french, german, spanish, italian, turkish).
        #[arg(short, long)]
        language: Option<Language>,

        /// Model size (base = fast, small = balanced, large = best).
        #[arg(short, long)]
        model_size: Option<ModelSize>,
    },

    /// List previously exported transcript files.
    Exports,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    let mut sessions = SessionStore::load();
    let api = Arc::new(HttpApi::from_config(&config.server));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(cli.command, &config, api, &mut sessions))
}

async fn run(
    command: Command,
    config: &AppConfig,
    api: Arc<HttpApi>,
    sessions: &mut SessionStore,
) -> Result<()> {
    match command {
        Command::Login { username } => {
            let password = prompt_password()?;
            let session = match api.login(&username, &password).await {
                Ok(session) => session,
                Err(ApiError::Auth) => bail!("invalid credentials"),
                Err(e) => return Err(anyhow::Error::new(e).context("login request failed")),
            };
            let name = session.username.clone();
            sessions.set(session)?;
            println!("logged in as {name}");
        }

        Command::Logout => {
            sessions.clear()?;
            println!("logged out");
        }

        Command::Exports => {
            let Some(session) = sessions.current() else {
                bail!("not logged in; run `transcribe-client login <username>` first");
            };
            match api.exported_files(session).await {
                Ok(files) if files.is_empty() => println!("no exported files"),
                Ok(files) => {
                    for file in files {
                        println!("{}\t{}", file.filename, api.absolute_url(&file.download_url));
                    }
                }
                Err(ApiError::Auth) => {
                    sessions.clear()?;
                    bail!("session expired; log in again");
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context("listing exported files failed"))
                }
            }
        }

        Command::Transcribe {
            files,
            url,
            language,
            model_size,
        } => {
            let input = build_input(files, url, language, model_size, config)?;
            transcribe(api, sessions, input).await?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// transcribe subcommand
// ---------------------------------------------------------------------------

/// Read the selected files and assemble a validated [`SubmissionInput`].
fn build_input(
    paths: Vec<PathBuf>,
    url: Option<String>,
    language: Option<Language>,
    model_size: Option<ModelSize>,
    config: &AppConfig,
) -> Result<SubmissionInput> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let data =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        files.push(MediaFile::new(name, data));
    }

    let input = SubmissionInput {
        files,
        url,
        language: language.unwrap_or(config.defaults.language),
        model_size: model_size.unwrap_or(config.defaults.model_size),
    };
    input.validate()?;
    Ok(input)
}

/// Run one submission with Ctrl-C wired to cancellation.
async fn transcribe(
    api: Arc<HttpApi>,
    sessions: &mut SessionStore,
    input: SubmissionInput,
) -> Result<()> {
    let session = sessions.current().cloned();
    let coordinator = Arc::new(Coordinator::new(Arc::clone(&api)));

    let submit = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.submit(input, session.as_ref()).await })
    };

    let watcher = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("cancelling...");
                coordinator.cancel().await;
            }
        })
    };

    let outcome = submit.await.context("submission task failed")?;
    watcher.abort();

    match outcome {
        Ok(SubmissionOutcome::Completed { results, job_id }) => {
            if let Some(id) = job_id {
                log::debug!("server job id: {id}");
            }
            for result in results {
                println!("== {}", result.filename);
                println!("{}", result.transcription);
                if let Some(link) = &result.download_url {
                    println!("exported: {}", api.absolute_url(link));
                }
                println!();
            }
        }
        Ok(SubmissionOutcome::Cancelled) => eprintln!("transcription cancelled"),
        Err(SubmitError::Auth) => {
            sessions.clear()?;
            bail!("session expired; log in again");
        }
        Err(e) => return Err(anyhow::Error::new(e).context("transcription failed")),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn prompt_password() -> Result<String> {
    use std::io::Write;

    eprint!("password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
