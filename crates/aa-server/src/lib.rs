//! # aa-server
//!
//! HTTP server hosting the SAML 2.0 attribute authority.
//!
//! The server loads the authority description (identity provider, service
//! providers, attribute catalog, release policy), wires it into a
//! [`QueryProcessor`] and serves the attribute service endpoints next to
//! health checks.
//!
//! ## Usage
//!
//! ```ignore
//! use aa_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod router;

pub use config::{AuthorityConfig, ServerConfig};
pub use router::create_router;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use aa_protocol_saml::endpoints::AttributeAuthorityState;
use aa_protocol_saml::processor::QueryProcessor;

/// The attribute authority server.
pub struct Server {
    config: ServerConfig,
    state: AttributeAuthorityState,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Reads the authority file and loads all key material up front, so a
    /// misconfigured server fails here rather than on the first query.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let authority = AuthorityConfig::load(&config.config_file)?;
        let base_dir = config
            .config_file
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let processor = build_processor(&authority, base_dir)?;

        tracing::info!(
            idp = %authority.idp.entity_id,
            service_providers = authority.service_providers.len(),
            attributes = authority.attributes.len(),
            "Attribute authority configured"
        );

        Ok(Self {
            config,
            state: AttributeAuthorityState::new(processor),
        })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let app = create_router(self.state);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates the application router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// Wires an authority description into a query processor.
pub fn build_processor(authority: &AuthorityConfig, base_dir: &Path) -> anyhow::Result<QueryProcessor> {
    let metadata = authority.metadata(base_dir)?;
    let catalog = authority.catalog()?;

    Ok(QueryProcessor::new(Arc::new(metadata), Arc::new(catalog))
        .with_release_policy(authority.policy.release_policy())
        .with_assertion_validity(authority.policy.assertion_validity()?))
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
