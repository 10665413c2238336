//! eqs-stitch: stitch one dual-lens recording with the configured engine.
//!
//! Usage:
//!   eqs-stitch --inputs sources/rawFootage/VID_20240101_001_00_01.insv
//!   eqs-stitch                       # pick a recording interactively
//!   eqs-stitch --inputs a.insv --dry-run

mod cli;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use eqs_core::config::{ConfigManager, Settings};
use eqs_core::jobs::{pick_recording, OutputTarget, StitchJobConfig};
use eqs_core::logging::{self, JobLogger, LogConfig, LogLevel};
use eqs_core::naming::resolve_pair;
use eqs_core::orchestrator::{CommandEngine, JobController};
use eqs_core::StitchError;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<StitchError>()
                .map(StitchError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ConfigManager::new(&cli.config);
    config.load_or_create().map_err(StitchError::from)?;
    let settings = config.settings().clone();

    let level = (0..cli.verbose).fold(settings.logging.level, |level, _| level.more_verbose());
    let _log_guard = if settings.logging.file_log {
        let guard = logging::init_tracing_with_file(level, &config.logs_folder())
            .with_context(|| format!("Failed to open log folder {}", config.logs_folder().display()))?;
        Some(guard)
    } else {
        logging::init_tracing(level);
        None
    };
    tracing::debug!("Loaded settings from {}", config.path().display());

    let inputs = if cli.inputs.is_empty() {
        vec![pick_interactively(&cli, &settings)?]
    } else {
        cli.inputs.clone()
    };

    let naming = settings.lens_naming()?;
    let pair = resolve_pair(&naming, &inputs)?;
    let job = StitchJobConfig::from_options(pair, &cli.stitch_options(), &settings.output_layout())?;

    let engine = CommandEngine::new(
        settings.engine.program.clone(),
        settings.engine.extra_args.clone(),
    );

    if cli.dry_run {
        let mut line = vec![engine.program().to_string()];
        line.extend(engine.command_line(&job));
        println!("{}", line.join(" "));
        return Ok(());
    }

    stitch(engine, &job, &config, level, settings.logging.file_log)
}

fn pick_interactively(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let dir = cli
        .sources_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.paths.sources_dir));
    let rules = settings.discovery_rules()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let path = pick_recording(&dir, &rules, &mut stdin.lock(), &mut stdout.lock())?;
    Ok(path)
}

fn stitch(
    engine: CommandEngine,
    job: &StitchJobConfig,
    config: &ConfigManager,
    level: LogLevel,
    file_log: bool,
) -> Result<()> {
    if let OutputTarget::File { path } = job.output() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StitchError::io(format!("creating {}", parent.display()), e))?;
        }
    }

    let logger = if file_log {
        Some(Arc::new(open_job_log(job, config, level)?))
    } else {
        None
    };

    if let Some(logger) = &logger {
        logger.phase("Stitching");
        logger.command(engine.program(), &engine.command_line(job));
        logger.json("job configuration", job);
    }

    let observer_logger = logger.clone();
    let mut controller = JobController::new(Box::new(engine)).with_progress_observer(Box::new(
        move |percent: u32| {
            let mut out = io::stdout().lock();
            let _ = write!(out, "\rprogress = {}%", percent);
            let _ = out.flush();
            if let Some(logger) = &observer_logger {
                logger.progress(percent);
            }
        },
    ));

    println!("start stitch");
    if let Err(e) = controller.start(job) {
        if let Some(logger) = &logger {
            logger.error(&e.to_string());
        }
        return Err(e.into());
    }

    let outcome = controller.wait_for_completion()?;
    let seconds = outcome.elapsed.as_secs_f64();
    println!();
    println!(
        "end stitch: {} in {:.3}s ({})",
        outcome.state,
        seconds,
        controller.engine_name()
    );

    let result = outcome.into_result();
    // The engine thread may still hold the observer's clone of the logger.
    if let Some(logger) = &logger {
        match &result {
            Ok(_) => logger.success(&format!("Stitched in {:.3}s", seconds)),
            Err(e) => logger.error(&e.to_string()),
        }
        logger.close();
    }
    result.map(|_| ()).map_err(Into::into)
}

/// Per-job log file under the configured logs folder.
fn open_job_log(job: &StitchJobConfig, config: &ConfigManager, level: LogLevel) -> Result<JobLogger> {
    let job_name = job
        .inputs()
        .primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stitch".to_string());
    let log_config = LogConfig {
        level,
        ..LogConfig::default()
    };
    let logger = JobLogger::new(job_name, config.logs_folder(), log_config, None)
        .map_err(|e| StitchError::io("creating job log", e))?;
    Ok(logger)
}
