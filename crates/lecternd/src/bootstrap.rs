//! Daemon bootstrap orchestration.
//!
//! Bootstrap runs the startup sequence in a fixed order: configuration,
//! telemetry, socket filesystem preparation, store and registry
//! composition. Each stage failure is a distinct error variant so the
//! operator sees which stage refused to start.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use lectern_config::{Config, ConfigError, SocketPreparationError};

use crate::auth::{Authenticator, TokenAuthority};
use crate::dispatch::{RequestRouter, SessionHandler};
use crate::services::{self, Stores};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ConnectionHandler, ListenerError, ListenerHandle, SocketListener};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Errors surfaced while serving.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The socket listener failed to bind or run.
    #[error("listener failure: {0}")]
    Listener(#[from] ListenerError),
    /// Waiting for a shutdown signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Shutdown listener that waits for termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(
                target: BOOTSTRAP_TARGET,
                signal,
                "shutdown signal received"
            );
        }
        Ok(())
    }
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
    stores: Arc<Stores>,
    session: Arc<SessionHandler>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Accessor for the shared data stores.
    #[must_use]
    pub fn stores(&self) -> &Arc<Stores> {
        &self.stores
    }

    /// Binds the configured endpoint and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when the endpoint cannot be bound.
    pub fn listen(&self) -> Result<RunningListener, ListenerError> {
        let listener = SocketListener::bind(&self.config.socket)?;
        let local_addr = listener.local_addr();
        let handle = listener.start(Arc::clone(&self.session) as Arc<dyn ConnectionHandler>)?;
        Ok(RunningListener { handle, local_addr })
    }

    /// Serves until a termination signal arrives, then drains the listener.
    ///
    /// # Errors
    ///
    /// Returns a [`ServeError`] when the listener fails or signal handlers
    /// cannot be installed.
    pub fn serve(&self) -> Result<(), ServeError> {
        self.serve_until(&SystemShutdownSignal)
    }

    /// [`Self::serve`] with an injectable shutdown trigger.
    ///
    /// # Errors
    ///
    /// See [`Self::serve`].
    pub fn serve_until(&self, signal: &dyn ShutdownSignal) -> Result<(), ServeError> {
        let running = self.listen()?;
        signal.wait()?;
        running.shutdown();
        running.join()?;
        info!(target: BOOTSTRAP_TARGET, "daemon stopped");
        Ok(())
    }
}

/// A started listener paired with its resolved address.
pub struct RunningListener {
    handle: ListenerHandle,
    local_addr: Option<SocketAddr>,
}

impl RunningListener {
    /// The bound TCP address, when listening on TCP.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Signals the accept loop to stop.
    pub fn shutdown(&self) {
        self.handle.shutdown();
    }

    /// Waits for the accept loop to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the listener thread
    /// panicked.
    pub fn join(self) -> Result<(), ListenerError> {
        self.handle.join()
    }
}

/// Bootstraps the daemon using the supplied configuration loader.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the stage that failed.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;

    let telemetry = telemetry::initialise(&config)
        .map_err(|source| BootstrapError::Telemetry { source })?;

    config
        .socket
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;

    let stores = Arc::new(Stores::seeded());
    let registry = Arc::new(services::build_registry(&stores));
    let router = Arc::new(RequestRouter::new(registry));
    let authenticator = Arc::new(Authenticator::new(TokenAuthority::new(&config.tokens)));
    let session = Arc::new(SessionHandler::new(authenticator, router));

    info!(
        target: BOOTSTRAP_TARGET,
        endpoint = %config.socket,
        "daemon bootstrapped"
    );

    Ok(Daemon {
        config,
        telemetry,
        stores,
        session,
    })
}

#[cfg(test)]
mod tests {
    use lectern_config::SocketEndpoint;

    use super::*;

    struct FixedLoader(Config);

    impl ConfigLoader for FixedLoader {
        fn load(&self) -> Result<Config, ConfigError> {
            Ok(self.0.clone())
        }
    }

    struct FailingLoader;

    impl ConfigLoader for FailingLoader {
        fn load(&self) -> Result<Config, ConfigError> {
            lectern_config::Config::load_with(|name| {
                (name == lectern_config::ENV_SOCKET).then(|| "not-a-url".to_owned())
            })
        }
    }

    fn loopback_config() -> Config {
        Config {
            socket: SocketEndpoint::tcp("127.0.0.1", 0),
            ..Config::default()
        }
    }

    #[test]
    fn bootstrap_surfaces_configuration_failures() {
        // Daemon carries trait objects and is deliberately not Debug, so
        // destructure rather than expect_err.
        let Err(error) = bootstrap_with(&FailingLoader) else {
            panic!("bootstrap must fail");
        };
        assert!(matches!(error, BootstrapError::Configuration { .. }));
    }

    #[test]
    fn bootstrap_produces_a_listenable_daemon() {
        let daemon =
            bootstrap_with(&FixedLoader(loopback_config())).expect("bootstrap daemon");
        let running = daemon.listen().expect("listen on loopback");
        assert!(running.local_addr().is_some());
        running.shutdown();
        running.join().expect("join listener");
    }
}
