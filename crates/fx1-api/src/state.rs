//! Application state shared across API handlers

use std::sync::Arc;

use fx1_core::ServiceConfig;
use fx1_token::{
    Environment, ExchangeVenue, SnapshotStore, SystemEnvironment, Token, TokenError,
};
use thiserror::Error;
use tokio::sync::Mutex;

/// Exchange venue as held by the service
pub type LedgerVenue = Box<dyn ExchangeVenue + Send>;

/// The ledger as held by the service
pub type ServiceToken = Token<LedgerVenue, SystemEnvironment>;

/// Errors that can occur in the API layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected by the ledger
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Persistence or configuration failure
    #[error(transparent)]
    Core(#[from] fx1_core::Error),

    /// The blocking worker running the operation panicked or was cancelled
    #[error("Ledger worker failed: {0}")]
    Worker(String),
}

impl ServiceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Token(e) => e.error_code(),
            Self::Core(fx1_core::Error::Store { .. }) => "store_error",
            Self::Core(_) => "internal_error",
            Self::Worker(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Token(e) => e.status_code(),
            Self::Core(_) | Self::Worker(_) => 500,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    token: Mutex<ServiceToken>,
    store: SnapshotStore,
}

impl AppState {
    /// Wrap an already constructed ledger; snapshots go to `config.state_path`
    pub fn new(config: ServiceConfig, token: ServiceToken) -> Self {
        let store = SnapshotStore::new(&config.state_path);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                token: Mutex::new(token),
                store,
            }),
        }
    }

    /// Restore the ledger from its snapshot, or deploy and save a fresh one.
    ///
    /// Blocking: the venue may be consulted during deployment, so call this
    /// from a blocking thread.
    pub fn open(config: ServiceConfig, venue: LedgerVenue) -> Result<Self, ServiceError> {
        let store = SnapshotStore::new(&config.state_path);
        let env = SystemEnvironment::new(config.contracts.iter().copied());

        let token = match store.load()? {
            Some(state) => {
                tracing::info!("Restored ledger from {}", store.path().display());
                Token::restore(state, venue, env)
            }
            None => {
                tracing::info!("No snapshot at {}, deploying", store.path().display());
                let mut token = Token::deploy(&config.deploy, venue, env)?;
                token.take_events();
                store.save(token.state(), token.env().now())?;
                token
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                token: Mutex::new(token),
                store,
            }),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Run a read-only query against the ledger
    pub async fn read<R>(&self, query: impl FnOnce(&ServiceToken) -> R) -> R {
        let token = self.inner.token.lock().await;
        query(&token)
    }

    /// Run a mutation on a blocking thread, then persist the new state.
    ///
    /// Rejected operations change nothing and are not persisted. If the
    /// snapshot cannot be written the change is undone in memory as well.
    pub async fn mutate<R, F>(&self, operation: &'static str, change: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut ServiceToken) -> fx1_token::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.apply(operation, change))
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))?
    }
}

impl AppStateInner {
    fn apply<R>(
        &self,
        operation: &'static str,
        change: impl FnOnce(&mut ServiceToken) -> fx1_token::Result<R>,
    ) -> Result<R, ServiceError> {
        let mut token = self.token.blocking_lock();
        let checkpoint = token.state().clone();
        let result = change(&mut token);
        let events = token.take_events();

        let value = result.inspect_err(|e| {
            tracing::debug!("{} rejected: {}", operation, e);
        })?;

        if let Err(e) = self.store.save(token.state(), token.env().now()) {
            tracing::warn!("{} not persisted, reverting: {}", operation, e);
            token.reset_state(checkpoint);
            return Err(e.into());
        }
        for event in &events {
            tracing::debug!(event = ?event, "{}", operation);
        }
        Ok(value)
    }
}
