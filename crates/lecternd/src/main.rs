use std::process::ExitCode;

use clap::Parser;

use lectern_config::{Config, ConfigError, LogFormat, SocketEndpoint};
use lecternd::{ConfigLoader, SystemConfigLoader, bootstrap_with};

/// The Lectern message-dispatch daemon.
#[derive(Debug, Parser)]
#[command(name = "lecternd", version, about)]
struct Cli {
    /// Socket endpoint to listen on (`unix://...` or `tcp://host:port`).
    #[arg(long)]
    socket: Option<SocketEndpoint>,
    /// Tracing filter expression, e.g. `info` or `lecternd=debug`.
    #[arg(long)]
    log_filter: Option<String>,
    /// Log output format (`json` or `compact`).
    #[arg(long)]
    log_format: Option<LogFormat>,
}

/// Loader layering CLI overrides on top of the environment.
struct CliConfigLoader {
    cli: Cli,
}

impl ConfigLoader for CliConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        let mut config = SystemConfigLoader.load()?;
        if let Some(socket) = &self.cli.socket {
            config.socket = socket.clone();
        }
        if let Some(log_filter) = &self.cli.log_filter {
            config.log_filter = log_filter.clone();
        }
        if let Some(log_format) = self.cli.log_format {
            config.log_format = log_format;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let loader = CliConfigLoader { cli: Cli::parse() };
    let daemon = match bootstrap_with(&loader) {
        Ok(daemon) => daemon,
        Err(error) => {
            eprintln!("lecternd: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = daemon.serve() {
        eprintln!("lecternd: {error}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
