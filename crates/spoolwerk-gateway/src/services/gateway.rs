// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service handle — built once at startup from `GatewayConfig`.
//
// Every field is Arc-backed, so the handle can be cloned into tasks freely.
// The adapter and cache store are shared by the directory, dispatcher and
// manager; nothing here holds per-request state.

use std::sync::Arc;

use tracing::info;

use spoolwerk_cache::{PrinterDirectory, open_store};
use spoolwerk_core::config::GatewayConfig;
use spoolwerk_core::error::Result;
use spoolwerk_print::{PrinterAdapter, build_adapter};

use crate::dispatch::{PrintDispatcher, Simulation};
use crate::management::PrinterManager;
use crate::submission::SubmissionHandler;

#[derive(Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    directory: PrinterDirectory,
    dispatcher: PrintDispatcher,
    manager: PrinterManager,
    submissions: SubmissionHandler,
}

impl Gateway {
    /// Build the adapter named by the config and wire everything to it.
    pub fn init(config: GatewayConfig) -> Result<Self> {
        let adapter = build_adapter(&config);
        Self::with_adapter(config, adapter)
    }

    /// Wire the gateway around an already-built adapter.
    pub fn with_adapter(config: GatewayConfig, adapter: Arc<dyn PrinterAdapter>) -> Result<Self> {
        let store = open_store(&config.cache)?;
        let directory = PrinterDirectory::new(adapter, store, config.cache.clone());

        let simulation = config.simulate_print.then(|| Simulation {
            delay: config.simulate_delay(),
        });
        let dispatcher = PrintDispatcher::new(directory.clone(), simulation);
        let manager = PrinterManager::new(directory.clone());
        let submissions = SubmissionHandler::new(dispatcher.clone());

        info!(
            transport = directory.adapter().transport(),
            simulate = config.simulate_print,
            "gateway services initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            directory,
            dispatcher,
            manager,
            submissions,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn directory(&self) -> &PrinterDirectory {
        &self.directory
    }

    pub fn dispatcher(&self) -> &PrintDispatcher {
        &self.dispatcher
    }

    pub fn manager(&self) -> &PrinterManager {
        &self.manager
    }

    pub fn submissions(&self) -> &SubmissionHandler {
        &self.submissions
    }
}

#[cfg(test)]
mod tests {
    use spoolwerk_core::config::{CacheBackend, TransportKind};

    use super::*;

    #[tokio::test]
    async fn mock_gateway_lists_printers() {
        let config = GatewayConfig {
            transport: TransportKind::Mock,
            ..GatewayConfig::default()
        };
        let gateway = Gateway::init(config).expect("init");
        let printers = gateway.directory().list(false).await.expect("list");
        assert_eq!(printers.len(), 2);
        assert_eq!(gateway.config().transport, TransportKind::Mock);
    }

    #[tokio::test]
    async fn sqlite_backed_cache_outlives_gateway() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = GatewayConfig {
            transport: TransportKind::Mock,
            cache: spoolwerk_core::config::CacheConfig {
                backend: CacheBackend::Sqlite {
                    path: dir.path().join("cache.db"),
                },
                ..Default::default()
            },
            ..GatewayConfig::default()
        };

        let first = Gateway::init(config.clone()).expect("init");
        first.directory().list(false).await.expect("populate");
        drop(first);

        let second = Gateway::init(config).expect("reinit");
        assert_eq!(
            second.directory().cache_state().await.expect("state"),
            spoolwerk_cache::CacheState::Fresh
        );
    }
}
