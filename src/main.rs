use anyhow::{Context, Result, bail};
use clap::Parser;
use horarios::acatlan::{ProgramRef, Report, SessionNegotiator, build_client};
use horarios::cli::{Args, Command};
use horarios::config::Config;
use horarios::logging::setup_logging;
use horarios::pacing::RealTimePacer;
use horarios::schedule::{self, ProgramCatalog};
use horarios::scraper::BatchOrchestrator;
use horarios::sink::{DatasetSink, JsonFileSink};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging depends on config, so a config error can only go to stderr
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting horarios"
    );

    let result = match args.command.unwrap_or_default() {
        Command::Scrape { programs, output } => scrape(&config, &programs, output).await,
        Command::Parse {
            file,
            program,
            name,
        } => parse_saved_report(&config, &file, &program, name).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "run failed");
            ExitCode::FAILURE
        }
    }
}

/// Restrict the configured catalog to `codes`, keeping catalog order.
fn select_programs(config: &Config, codes: &[String]) -> Result<Vec<ProgramRef>> {
    if codes.is_empty() {
        return Ok(config.programs.clone());
    }

    if let Some(unknown) = codes
        .iter()
        .find(|code| !config.programs.iter().any(|p| &p.code == *code))
    {
        bail!("Program {unknown} is not in the configured catalog");
    }

    Ok(config
        .programs
        .iter()
        .filter(|p| codes.contains(&p.code))
        .cloned()
        .collect())
}

async fn scrape(config: &Config, codes: &[String], output: Option<PathBuf>) -> Result<ExitCode> {
    let programs = select_programs(config, codes)?;
    let pacing = config.pacing();
    let pacer = Arc::new(RealTimePacer);

    let http = build_client(&config.user_agent, config.request_timeout)
        .context("Failed to build HTTP client")?;
    let negotiator = SessionNegotiator::new(http, config.endpoints()?, pacing, pacer.clone());
    info!(
        menu = %negotiator.endpoints().menu,
        programs = programs.len(),
        "source configured"
    );

    let orchestrator = BatchOrchestrator::new(Arc::new(negotiator), pacer, pacing)
        .with_retry(config.retry_policy());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current step");
                cancel.cancel();
            }
        }
    });

    let (dataset, summary) = orchestrator.run_with_summary(&programs, &cancel).await;

    if summary.cancelled {
        warn!(
            completed = dataset.total_programs(),
            "batch interrupted, not publishing a partial dataset"
        );
        return Ok(ExitCode::FAILURE);
    }
    if dataset.total_programs() == 0 && !programs.is_empty() {
        error!("no program could be retrieved, keeping the previous dataset");
        return Ok(ExitCode::FAILURE);
    }

    let sink = JsonFileSink::new(output.unwrap_or_else(|| config.output_path.clone()));
    sink.publish(&dataset).await?;

    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            total = programs.len(),
            "dataset published with missing programs"
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn parse_saved_report(
    config: &Config,
    file: &Path,
    code: &str,
    name: Option<String>,
) -> Result<ExitCode> {
    let program = match name {
        Some(name) => ProgramRef::new(code, name),
        None => config
            .programs
            .iter()
            .find(|p| p.code == code)
            .cloned()
            .with_context(|| format!("Program {code} is not in the catalog; pass --name"))?,
    };

    let body = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let catalog = match Report::from_body(body) {
        Report::Empty => ProgramCatalog::empty(program.code.as_str(), program.name.as_str()),
        Report::Populated(html) => schedule::build_catalog(&program, &html)
            .with_context(|| format!("Failed to parse {}", file.display()))?,
    };
    info!(
        courses = catalog.course_count(),
        groups = catalog.group_count(),
        "report parsed"
    );

    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(ExitCode::SUCCESS)
}
