//! # Service Container
//!
//! Opens storage and builds the services in dependency order:
//!
//! ```text
//! Database ─┬─→ LedgerChainEngine ─┬─→ BatchLifecycleManager
//!           │   SerialGenerator ───┤
//!           └──────────────────────┴─→ VerificationResolver
//! ```
//!
//! Every service receives the same `Arc<Database>` and clock. The data
//! directory lock lives as long as the container.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use pas_01_serial_generator::SerialGenerator;
use pas_03_ledger_chain::LedgerChainEngine;
use pas_04_batch_lifecycle::BatchLifecycleManager;
use pas_05_verification::VerificationResolver;
use pas_06_api_gateway::AppState;
use shared_store::Database;
use shared_types::{Clock, SystemClock};

use crate::adapters::storage::{open_store, DataDirLock};
use crate::container::config::NodeConfig;

pub struct ServiceContainer {
    pub db: Arc<Database>,
    pub ledger: Arc<LedgerChainEngine>,
    pub lifecycle: Arc<BatchLifecycleManager>,
    pub verification: Arc<VerificationResolver>,
    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
    _lock: Option<DataDirLock>,
}

impl ServiceContainer {
    /// Build with the system clock.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    #[instrument(name = "service_init", skip_all, fields(backend = %config.storage.backend))]
    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let secret = config.auth_secret()?;

        let opened = open_store(&config.storage)?;
        let db = Arc::new(
            Database::open(opened.store, config.database_config())
                .context("Failed to open database")?,
        );
        info!("Database opened");

        let serials = Arc::new(SerialGenerator::new(secret));
        let ledger = Arc::new(LedgerChainEngine::new(Arc::clone(&db), Arc::clone(&clock)));
        let lifecycle = Arc::new(BatchLifecycleManager::new(
            Arc::clone(&db),
            Arc::clone(&clock),
            serials.clone(),
            Arc::clone(&ledger),
            config.lifecycle_config(),
        ));
        let verification = Arc::new(VerificationResolver::new(
            Arc::clone(&db),
            clock,
            serials,
            ledger.clone(),
            config.verification_config(),
        ));
        info!("Services initialized");

        Ok(Self {
            db,
            ledger,
            lifecycle,
            verification,
            config,
            _lock: opened.lock,
        })
    }

    /// Handler state for the gateway.
    pub fn app_state(&self) -> AppState {
        AppState {
            lifecycle: self.lifecycle.clone(),
            ledger: self.ledger.clone(),
            verification: self.verification.clone(),
        }
    }
}
