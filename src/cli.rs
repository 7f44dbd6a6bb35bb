use crate::{
    audit::Auditor,
    config::{Config, Period},
    export,
    probe::{DurationProbe, Ffprobe},
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "coverage-audit")]
#[command(about = "Audit a directory of recordings against expected daily coverage")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./coverage-audit.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Doctor {},
    /// Print the measured duration of a single recording.
    Probe {
        #[arg(long)]
        input: PathBuf,
    },
    /// Generate and export reports for one period or every configured period.
    Run {
        /// Period start, `YYYY-MM-DD HH-MM-SS`. Overrides configured periods.
        #[arg(long)]
        start: Option<String>,
        /// Period end; defaults to one day after --start.
        #[arg(long, requires = "start")]
        end: Option<String>,
        #[arg(long)]
        source_dir: Option<PathBuf>,
        #[arg(long)]
        report_dir: Option<PathBuf>,
        /// Recordings shorter than this many seconds count as errors.
        #[arg(long)]
        threshold: Option<i64>,
    },
}

/// Marks an error that was already written to the configured log sinks.
#[derive(Debug)]
pub struct Logged;

impl std::fmt::Display for Logged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("command failed")
    }
}

/// True when `err` went through the logger and needs no further printing.
pub fn already_logged(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Logged>().is_some()
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let mut cfg = match cfg_path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    if let Command::Run {
        source_dir,
        report_dir,
        threshold,
        ..
    } = &args.cmd
    {
        if let Some(dir) = source_dir {
            cfg.paths.source_dir = dir.display().to_string();
        }
        if let Some(dir) = report_dir {
            cfg.paths.report_dir = dir.display().to_string();
        }
        if let Some(secs) = threshold {
            cfg.audit.error_threshold_seconds = *secs;
        }
    }

    let guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
    let result = execute(&args, &cfg);
    if let Err(err) = &result {
        error!("{:#}", err);
    }
    // Flush the file writer before the process exits.
    drop(guard);
    result.context(Logged)
}

fn execute(args: &Args, cfg: &Config) -> Result<()> {
    match &args.cmd {
        Command::Doctor {} => doctor(cfg),
        Command::Probe { input } => probe(cfg, input),
        Command::Run { start, end, .. } => {
            let periods = match start {
                Some(start) => vec![Period::starting_at(start, end.as_deref())?],
                None => cfg.periods.clone(),
            };
            run(cfg, &periods)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("coverage-audit.toml");
    if default.exists() {
        return Some(default);
    }
    let example = PathBuf::from("coverage-audit.example.toml");
    example.exists().then_some(example)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.paths.report_dir).join("coverage-audit.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let diag = Ffprobe::new(cfg).doctor();
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn probe(cfg: &Config, input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }
    let duration = Ffprobe::new(cfg).duration_seconds(input)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "duration": duration,
            "error": duration < cfg.audit.error_threshold_seconds,
        }))?
    );
    Ok(())
}

fn run(cfg: &Config, periods: &[Period]) -> Result<()> {
    if periods.is_empty() {
        warn!("no periods configured; pass --start or add [[periods]] to the config");
        return Ok(());
    }

    let started = now_rfc3339();
    let auditor = Auditor::new(cfg, Ffprobe::new(cfg));
    let report_dir = PathBuf::from(&cfg.paths.report_dir);

    let mut written = Vec::with_capacity(periods.len());
    for period in periods {
        let report = auditor
            .audit_period(period)
            .with_context(|| format!("generating report for {}", period.start))?;
        let path = export::export(&report, &report_dir)?;
        written.push(serde_json::json!({
            "start_time": report.start_time,
            "report": path,
            "record_percentage": report.result.record_percentage,
            "total_error": report.result.total_error,
            "unprocessable": report.result.unprocessable_file.len(),
        }));
    }
    info!("wrote {} reports to {}", written.len(), report_dir.display());

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "started": started,
                "finished": now_rfc3339(),
                "reports": written,
                "status": "ok"
            }))?
        );
    }

    Ok(())
}
