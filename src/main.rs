//! claude-consolidate - Merge per-project Claude Code permissions into the
//! global settings file
//!
//! # Usage
//!
//! ```bash
//! # Scan ~/code and merge into ~/.claude/settings.json
//! claude-consolidate --root ~/code
//!
//! # Show what would change without touching anything
//! claude-consolidate --root ~/code --dry-run
//!
//! # Machine-readable report
//! claude-consolidate --root ~/code --format json
//! ```

use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_consolidate::{
    audit::AuditLogger,
    config::Config,
    engine::{ConsolidateOptions, Consolidator},
    error::exit_code,
    fs::OsFileSystem,
    output::{format_report, JsonReport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Merge per-project .claude/settings.local.json permissions into the global settings
#[derive(Parser, Debug)]
#[command(name = "claude-consolidate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory to scan for .claude/settings.local.json files
    #[arg(long, env = "CLAUDE_CONSOLIDATE_ROOT")]
    root: Option<PathBuf>,

    /// Global settings file to merge into
    #[arg(long, env = "CLAUDE_CONSOLIDATE_GLOBAL")]
    global: Option<PathBuf>,

    /// Report what would change without writing anything
    #[arg(short, long)]
    dry_run: bool,

    /// Path to configuration file
    #[arg(short, long, env = "CLAUDE_CONSOLIDATE_CONFIG")]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Maximum directory depth below the root
    #[arg(long)]
    max_depth: Option<usize>,

    /// Do not back up the global settings file before rewriting it
    #[arg(long)]
    no_backup: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CLAUDE_CONSOLIDATE_LOG", default_value = "warn")]
    log_level: String,
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are reported as errors by clap
            let code = if e.use_stderr() {
                exit_code::USAGE
            } else {
                exit_code::SUCCESS
            };
            process::exit(code);
        }
    }
}

fn load_config(args: &Args) -> Result<Config, String> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .map_err(|e| format!("Failed to load config from {}: {}", path.display(), e))?,
        None => Config::load(),
    };

    if let Some(depth) = args.max_depth {
        config.discovery.max_depth = depth;
    }
    if args.no_backup {
        config.backup.enabled = false;
    }

    Ok(config)
}

fn print_report(format: Format, text: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = write!(handle, "{}", text);
    if format == Format::Json {
        let _ = writeln!(handle);
    }
    let _ = handle.flush();
}

fn main() {
    let args = parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(message) => {
            error!("{}", message);
            eprintln!("Error: {}", message);
            process::exit(exit_code::FAILURE);
        }
    };

    let Some(root) = args.root.clone().or_else(|| config.discovery_root()) else {
        eprintln!("Error: no root directory given and no home directory found");
        process::exit(exit_code::USAGE);
    };
    let global_path = args
        .global
        .clone()
        .unwrap_or_else(|| config.global_settings_path());

    let options = ConsolidateOptions {
        root,
        global_path,
        dry_run: args.dry_run,
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %options.root.display(),
        global = %options.global_path.display(),
        dry_run = options.dry_run,
        "starting consolidation"
    );

    let audit_path = if config.general.audit_log {
        config.audit_path()
    } else {
        None
    };
    let mut logger = AuditLogger::new(audit_path.as_deref());

    let consolidator = Consolidator::new(OsFileSystem, config);
    let outcome = consolidator.run(&options);

    if let Err(e) = logger.log_run(&options, &outcome) {
        warn!(error = %e, "failed to write audit log");
    }

    match outcome {
        Ok(consolidation) => {
            match args.format {
                Format::Text => {
                    let mut text = format_report(&consolidation.result, consolidation.dry_run);
                    if let Some(backup) = &consolidation.backup {
                        text.push_str(&format!("Backup: {}\n", backup.display()));
                    }
                    if !consolidation.dry_run && !consolidation.changed {
                        text.push_str("Global settings already up to date.\n");
                    }
                    print_report(args.format, &text);
                }
                Format::Json => {
                    let json = JsonReport::from_consolidation(&consolidation).to_json();
                    print_report(args.format, &json);
                }
            }
            process::exit(exit_code::SUCCESS);
        }
        Err(e) => {
            error!(error = %e, "consolidation failed");
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}
