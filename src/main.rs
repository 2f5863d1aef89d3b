use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use femto_acs::config::ConfigOverrides;
use femto_acs::cwmp::NeedsConfigStore;
use femto_acs::db::LedgerRepo;
use femto_acs::{Config, Daemon, ParameterSource};

/// femto-acs - TR-069/CWMP auto configuration server for femtocells
#[derive(Parser)]
#[command(name = "femto-acs", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "FEMTO_ACS_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "FEMTO_ACS_BIND")]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(long, env = "FEMTO_ACS_PORT")]
    port: Option<u16>,

    /// INI parameter file with `[Common]` and per-serial sections
    #[arg(long, env = "FEMTO_ACS_PARAMS")]
    params: Option<PathBuf>,

    /// Directory holding the session/ledger database
    #[arg(long, env = "FEMTO_ACS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the parameters that would be pushed to a device
    Resolve {
        /// Device serial number
        serial: String,
    },
    /// Mark a device as needing configuration on its next poll
    Mark {
        /// Device serial number
        serial: String,
        /// Clear the flag instead of setting it
        #[arg(long)]
        clear: bool,
    },
    /// Forget a device, so its next poll is treated as first contact
    Forget {
        /// Device serial number
        serial: String,
    },
    /// Show whether a device is waiting for configuration
    Status {
        /// Device serial number
        serial: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,femto_acs=info",
        1 => "info,femto_acs=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        config_file: cli.config,
        bind: cli.bind,
        port: cli.port,
        params_file: cli.params,
        data_dir: cli.data_dir,
    };
    let config = Config::load(&overrides)?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Resolve { serial } => cmd_resolve(&config, &serial),
            Command::Mark { serial, clear } => cmd_mark(config, &serial, !clear),
            Command::Forget { serial } => cmd_forget(config, &serial),
            Command::Status { serial } => cmd_status(config, &serial),
        };
    }

    tracing::info!(
        addr = %config.server.addr(),
        params = %config.params_file.display(),
        "starting femto-acs"
    );

    Daemon::new(config)?.run().await?;

    Ok(())
}

fn cmd_resolve(config: &Config, serial: &str) -> anyhow::Result<()> {
    let source = ParameterSource::load(&config.params_file)?;
    if !source.has_section(serial) {
        println!("# no [{serial}] section, common parameters only");
    }
    for (name, entry) in source.resolve(Some(serial)) {
        println!("{name} = {}|{}", entry.value, entry.xmltype);
    }
    Ok(())
}

fn cmd_mark(config: Config, serial: &str, needs_push: bool) -> anyhow::Result<()> {
    let daemon = Daemon::new(config)?;
    LedgerRepo::new(daemon.db().clone()).set(serial, needs_push)?;
    if needs_push {
        println!("{serial}: configuration will be pushed on next poll");
    } else {
        println!("{serial}: marked as configured");
    }
    Ok(())
}

fn cmd_forget(config: Config, serial: &str) -> anyhow::Result<()> {
    let daemon = Daemon::new(config)?;
    if LedgerRepo::new(daemon.db().clone()).remove(serial)? {
        println!("{serial}: forgotten");
    } else {
        println!("{serial}: not in ledger");
    }
    Ok(())
}

fn cmd_status(config: Config, serial: &str) -> anyhow::Result<()> {
    let daemon = Daemon::new(config)?;
    let status = match LedgerRepo::new(daemon.db().clone()).get(serial)? {
        Some(true) => "needs configuration",
        Some(false) => "configured",
        None => "unknown",
    };
    println!("{serial}: {status}");
    Ok(())
}
