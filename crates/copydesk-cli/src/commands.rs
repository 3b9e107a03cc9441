use std::future::Future;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use copydesk::builder::{GenerationOutcome, Studio, StudioBuilder};
use copydesk::persist::SavedResult;
use copydesk::types::{CredentialProvider, FileCredentials, StaticCredentials};

use crate::cli::AnyRequest;
use crate::config::Config;
use crate::progress::ProgressPrinter;

/// Exit code after a user interrupt (128 + SIGINT)
pub const EXIT_INTERRUPTED: u8 = 130;

/// What one `generate` run produced
#[derive(Debug)]
pub struct GenerateReport {
    pub outcome: GenerationOutcome,
    pub saved: Option<SavedResult>,
}

impl GenerateReport {
    pub fn exit_code(&self) -> ExitCode {
        match self.outcome {
            GenerationOutcome::Completed { .. } => ExitCode::SUCCESS,
            GenerationOutcome::Failed(_) => ExitCode::FAILURE,
            GenerationOutcome::Cancelled => ExitCode::from(EXIT_INTERRUPTED),
        }
    }
}

/// Credentials from `COPYDESK_TOKEN`, else from the session file
pub fn credentials(config: &Config) -> Result<Arc<dyn CredentialProvider>> {
    if let Some(token) = &config.token {
        return Ok(Arc::new(StaticCredentials::new(token.clone())));
    }
    match &config.generation.session_file {
        Some(path) => {
            let stored = FileCredentials::load(path)
                .with_context(|| format!("Failed to read session file {}", path))?;
            Ok(Arc::new(stored))
        }
        None => Ok(Arc::new(StaticCredentials::anonymous())),
    }
}

pub fn build_studio(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Studio> {
    let mut builder = StudioBuilder::new()
        .stream_config(config.stream_config())
        .credentials(credentials);
    if let Some(url) = &config.store.url {
        builder = builder.store_url(url);
    }
    builder.build()
}

/// Run one generation, rendering progress until it settles.
///
/// `interrupt` resolving cancels the live session; the run then ends as
/// [`GenerationOutcome::Cancelled`] with nothing saved.
pub async fn generate<W, I>(
    studio: &Studio,
    request: &AnyRequest,
    save: bool,
    interrupt: I,
    progress: &mut ProgressPrinter<W>,
) -> Result<GenerateReport>
where
    W: Write,
    I: Future<Output = ()>,
{
    let mut handle = request.start(studio)?;
    let cancel = handle.cancel_token();
    tracing::info!(kind = %request.kind(), source = request.source_id(), "Generation started");

    tokio::pin!(interrupt);
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = &mut interrupt, if !interrupted => {
                tracing::info!("Interrupted, cancelling generation");
                interrupted = true;
                cancel.cancel();
            }
            event = handle.next_event() => match event {
                Some(event) => progress.on_event(&event)?,
                None => break,
            },
        }
    }
    progress.end_line()?;

    let outcome = studio.finish(handle).await?;
    let saved = match (&outcome, save) {
        (GenerationOutcome::Completed { result, .. }, true) => {
            Some(studio.save(result, request.source_id()).await?)
        }
        _ => None,
    };

    Ok(GenerateReport { outcome, saved })
}

pub fn login(config: &Config, token: &str) -> Result<()> {
    let path = config
        .generation
        .session_file
        .as_deref()
        .context("No session_file configured under [generation]")?;
    FileCredentials::load(path)?.login(token)?;
    tracing::info!(path = %path, "Session stored");
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    if let Some(path) = config.generation.session_file.as_deref() {
        FileCredentials::load(path)?.logout()?;
        tracing::info!(path = %path, "Session cleared");
    }
    Ok(())
}
