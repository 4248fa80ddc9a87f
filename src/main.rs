//! Storyline CLI entrypoint: inspect and edit the presentation embedded in a
//! pull request description.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use storyline::{
    AnnotationSession, Comment, GithubError, HostTextGateway, Marker, OctocrabGateway,
    OperationMode, PersistOutcome, PersonalAccessToken, PullRequestLocator, SessionError,
    SessionOptions, StderrJsonlTelemetrySink, StorylineConfig, Visual, VisualId,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SessionError> {
    let config = load_config()?;
    init_logging(config.verbose);

    let locator = PullRequestLocator::parse(config.require_pr_url()?)?;
    let token = PersonalAccessToken::new(config.resolve_token()?)?;
    let gateway = OctocrabGateway::for_token(&token, &locator)?;

    let options = SessionOptions {
        marker: Marker::default(),
        save_frequency: config.resolve_save_frequency()?,
    };
    let mut session = AnnotationSession::new(gateway, options);
    if config.verbose {
        session = session.with_telemetry(Arc::new(StderrJsonlTelemetrySink));
    }

    if session.load().await?.is_none() {
        tracing::info!("pull request has no saved presentation yet");
    }

    let mode = config.operation_mode();
    match mode {
        OperationMode::Export => return write_export(&session),
        OperationMode::Summary => {}
        OperationMode::Save => report_outcome(session.persist().await?)?,
        OperationMode::Import => import_file(&session, &config)?,
        OperationMode::Clear => {
            let removed = session.edit(|presentation, _| presentation.remove_all_visuals());
            tracing::info!(removed, "cleared presentation");
        }
        OperationMode::Add => add_comment(&session, &config)?,
        OperationMode::Remove => remove_visual(&session, &config),
        OperationMode::Move => move_visual(&session, &config)?,
    }

    if !matches!(mode, OperationMode::Summary | OperationMode::Save) {
        finish_edit(&session, config.save).await?;
    }

    write_summary(&session, &locator)
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`GithubError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<StorylineConfig, GithubError> {
    StorylineConfig::load().map_err(|error| GithubError::Configuration {
        message: error.to_string(),
    })
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let installed = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn import_file<G: HostTextGateway>(
    session: &AnnotationSession<G>,
    config: &StorylineConfig,
) -> Result<(), SessionError> {
    let Some(path) = config.import_path.as_deref() else {
        return Ok(());
    };
    let raw = std::fs::read_to_string(path).map_err(|error| GithubError::Io {
        message: format!("failed to read {path}: {error}"),
    })?;
    let value = serde_json::from_str(&raw).map_err(|error| SessionError::Document {
        message: format!("{path}: {error}"),
    })?;
    let report = session.import_value(value)?;
    if report.skipped > 0 {
        tracing::warn!(skipped = report.skipped, "some visuals could not be imported");
    }
    Ok(())
}

fn add_comment<G: HostTextGateway>(
    session: &AnnotationSession<G>,
    config: &StorylineConfig,
) -> Result<(), SessionError> {
    let anchor = config.require_anchor()?;
    let text = config.text.clone().unwrap_or_default();
    let position = config.position;

    let index = session.edit(|presentation, ids| {
        let existing = presentation
            .find_by_line_no(anchor.file().filename(), anchor.line_no())
            .and_then(Visual::as_comment)
            .cloned();
        let (comment, target) = match existing {
            Some(comment) => {
                let current = presentation.index_of(comment.id());
                (comment.with_text(text), position.or(current))
            }
            None => (Comment::create(ids, anchor).with_text(text), position),
        };
        presentation.add_or_replace_visual(comment.into(), target)
    });
    tracing::debug!(index, "comment placed");
    Ok(())
}

fn remove_visual<G: HostTextGateway>(session: &AnnotationSession<G>, config: &StorylineConfig) {
    let Some(raw) = config.remove_id.as_deref() else {
        return;
    };
    let id = VisualId::new(raw.trim());
    let removed = session.edit(|presentation, _| presentation.remove_visual(&id));
    if removed.is_none() {
        tracing::warn!("no visual with id {id}");
    }
}

fn move_visual<G: HostTextGateway>(
    session: &AnnotationSession<G>,
    config: &StorylineConfig,
) -> Result<(), SessionError> {
    let Some(raw) = config.move_id.as_deref() else {
        return Ok(());
    };
    let position = config.require_position()?;
    let id = VisualId::new(raw.trim());
    let moved = session.edit(|presentation, _| presentation.move_visual(&id, position));
    if moved.is_none() {
        tracing::warn!("no visual with id {id}");
    }
    Ok(())
}

async fn finish_edit<G: HostTextGateway>(
    session: &AnnotationSession<G>,
    force: bool,
) -> Result<(), SessionError> {
    if force {
        return report_outcome(session.persist().await?);
    }
    match session.autosave().await? {
        Some(outcome) => report_outcome(outcome),
        None if session.has_unsaved_changes() => {
            write_line("changes not saved (save_frequency is manual; pass --save)")
        }
        None => Ok(()),
    }
}

fn report_outcome(outcome: PersistOutcome) -> Result<(), SessionError> {
    match outcome {
        PersistOutcome::Saved { version } => write_line(&format!("saved version {version}")),
        PersistOutcome::Coalesced => Ok(()),
    }
}

fn write_export<G: HostTextGateway>(session: &AnnotationSession<G>) -> Result<(), SessionError> {
    let value = session
        .export()
        .to_value()
        .map_err(|error| SessionError::Encode {
            message: error.to_string(),
        })?;
    write_line(&format!("{value:#}"))
}

fn write_summary<G: HostTextGateway>(
    session: &AnnotationSession<G>,
    locator: &PullRequestLocator,
) -> Result<(), SessionError> {
    let version = session.export().metadata.version;
    let lines = session.with_presentation(|presentation| {
        let mut lines = vec![format!(
            "{}/{}#{}: {} annotation(s), version {version}",
            locator.owner().as_str(),
            locator.repository().as_str(),
            locator.number().get(),
            presentation.len(),
        )];
        lines.extend(presentation.iter().enumerate().map(|(index, visual)| {
            let context = visual.context();
            let text = visual.as_comment().map_or("", Comment::text);
            format!(
                "{index:>3}. [{}] {}:{} {text}",
                visual.id(),
                context.file().filename(),
                context.line_no(),
            )
        }));
        lines
    });
    write_line(&lines.join("\n"))
}

fn write_line(message: &str) -> Result<(), SessionError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{message}").map_err(|error| {
        SessionError::Github(GithubError::Io {
            message: error.to_string(),
        })
    })
}
