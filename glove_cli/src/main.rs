#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FILE_GUARD};

fn init_tracing(cli: &Cli, logging: &glove_config::Logging) {
    let level = logging.level.as_deref().unwrap_or(&cli.log_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let name = path
            .file_name()
            .map_or_else(|| "glove.log".into(), |n| n.to_os_string());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(writer)
            .init();
    } else if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(cli: &Cli) -> eyre::Result<glove_config::Config> {
    let cfg = if cli.config.exists() {
        let text = std::fs::read_to_string(&cli.config)
            .wrap_err_with(|| format!("read config {:?}", cli.config))?;
        glove_config::load_toml(&text).wrap_err_with(|| format!("parse config {:?}", cli.config))?
    } else {
        glove_config::Config::default()
    };
    cfg.validate().wrap_err("validate config")?;
    Ok(cfg)
}

fn load_calibration(cli: &Cli) -> eyre::Result<Option<Vec<glove_config::CalibrationRow>>> {
    cli.calibration
        .as_deref()
        .map(glove_config::load_calibration_csv)
        .transpose()
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", error_fmt::humanize(&e));
            return Err(e);
        }
    };
    init_tracing(&cli, &cfg.logging);

    let result = match &cli.cmd {
        Commands::Run {
            ticks,
            echo_display,
            telemetry,
        } => {
            let calibration = load_calibration(&cli)?;
            let overrides = run::resolve_overrides(&cfg, calibration.as_deref())?;

            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::Relaxed);
            })
            .wrap_err("install Ctrl-C handler")?;

            let opts = run::RunOpts {
                max_ticks: *ticks,
                echo_display: *echo_display,
                telemetry: *telemetry,
            };
            run::run(&cfg, overrides, &opts, shutdown)
        }
        Commands::Check => {
            let calibration = load_calibration(&cli)?;
            let overrides = run::resolve_overrides(&cfg, calibration.as_deref())?;
            println!(
                "config OK: variant={:?} tick_hz={} overridden_channels={}",
                cfg.device.variant,
                cfg.device.tick_hz,
                overrides.len()
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", error_fmt::humanize(&e));
        return Err(e);
    }
    Ok(())
}
