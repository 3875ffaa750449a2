// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer directory — stale-while-revalidate view of the printer fleet.
//
// One cache slot holds a `CacheEntry`:
//
//   EMPTY ──sync refresh──▶ FRESH ──threshold passes──▶ STALE
//                             ▲                           │
//                             └──── background refresh ───┘
//
// Stale entries are served immediately; at most one background refresh runs
// per directory at a time.  The store TTL is much longer than the staleness
// threshold, so the slot normally only returns to EMPTY via `clear_cache`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use spoolwerk_core::config::CacheConfig;
use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{CacheEntry, CachedPrinter};
use spoolwerk_print::PrinterAdapter;

use crate::identity::printer_id;
use crate::store::CacheStore;

/// Observable state of the cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Shared handle to the printer cache.  Cheap to clone.
#[derive(Clone)]
pub struct PrinterDirectory {
    inner: Arc<DirectoryInner>,
}

struct DirectoryInner {
    adapter: Arc<dyn PrinterAdapter>,
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    refreshing: AtomicBool,
    /// Last `lastUpdated` this process wrote.  Held across the store write
    /// so overlapping refreshes commit in stamp order.
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

/// Clears the single-flight flag when the refresh task ends, however it
/// ends.
struct RefreshGuard {
    inner: Arc<DirectoryInner>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.inner.refreshing.store(false, Ordering::Release);
    }
}

impl PrinterDirectory {
    pub fn new(adapter: Arc<dyn PrinterAdapter>, store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                adapter,
                store,
                config,
                refreshing: AtomicBool::new(false),
                last_stamp: Mutex::new(None),
            }),
        }
    }

    pub fn adapter(&self) -> &Arc<dyn PrinterAdapter> {
        &self.inner.adapter
    }

    /// The printer list.
    ///
    /// Blocks on the adapter only when `force_refresh` is set or the slot is
    /// empty.  A stale entry is returned as-is after kicking off a background
    /// refresh.
    #[instrument(skip(self))]
    pub async fn list(&self, force_refresh: bool) -> Result<Vec<CachedPrinter>> {
        if force_refresh {
            return Ok(self.refresh_cache().await?.printers);
        }
        match self.read_entry().await? {
            Some(entry) => {
                if self.is_stale(&entry, Utc::now()) {
                    self.trigger_background_refresh();
                }
                Ok(entry.printers)
            }
            None => Ok(self.refresh_cache().await?.printers),
        }
    }

    /// Fetch from the adapter, assign identifiers, and store the result.
    #[instrument(skip(self))]
    pub async fn refresh_cache(&self) -> Result<CacheEntry> {
        let printers = self.inner.adapter.list_printers().await?;

        let mut last = self.inner.last_stamp.lock().await;
        let stamp = next_stamp(*last, Utc::now());

        let entry = CacheEntry {
            printers: printers
                .into_iter()
                .map(|p| CachedPrinter {
                    id: printer_id(&p.name),
                    name: p.name,
                    uri: p.uri,
                    cached_at: stamp,
                })
                .collect(),
            last_updated: stamp,
        };

        let json = serde_json::to_string(&entry)?;
        self.inner
            .store
            .set(&self.inner.config.key, json, self.inner.config.storage_ttl())
            .await?;
        *last = Some(stamp);
        drop(last);

        info!(count = entry.printers.len(), "printer cache refreshed");
        Ok(entry)
    }

    /// Look up a printer by identifier, populating an empty cache first.
    /// Staleness is not checked on this path.
    #[instrument(skip(self))]
    pub async fn get_printer_by_id(&self, id: &str) -> Result<Option<CachedPrinter>> {
        let entry = self.entry_or_populate().await?;
        Ok(entry.find(id).cloned())
    }

    /// Resolve an identifier for print dispatch.
    ///
    /// Uses the current entry even when stale (triggering a background
    /// refresh as a side effect).  An identifier missing from the entry is
    /// `PrinterNotFound`; the in-flight refresh is not awaited.
    #[instrument(skip(self))]
    pub async fn resolve_for_dispatch(&self, id: &str) -> Result<CachedPrinter> {
        let entry = self.entry_or_populate().await?;
        if self.is_stale(&entry, Utc::now()) {
            self.trigger_background_refresh();
        }
        entry
            .find(id)
            .cloned()
            .ok_or_else(|| SpoolwerkError::PrinterNotFound(id.to_owned()))
    }

    /// Drop the stored entry; the next read repopulates synchronously.
    pub async fn clear_cache(&self) -> Result<()> {
        self.inner.store.delete(&self.inner.config.key).await?;
        info!("printer cache cleared");
        Ok(())
    }

    pub async fn cache_state(&self) -> Result<CacheState> {
        Ok(match self.read_entry().await? {
            None => CacheState::Empty,
            Some(entry) if self.is_stale(&entry, Utc::now()) => CacheState::Stale,
            Some(_) => CacheState::Fresh,
        })
    }

    /// Whether a background refresh is currently running.
    pub fn refresh_in_flight(&self) -> bool {
        self.inner.refreshing.load(Ordering::Acquire)
    }

    /// Start a background refresh unless one is already running.  Returns
    /// whether a refresh was started.
    pub fn trigger_background_refresh(&self) -> bool {
        if self
            .inner
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("refresh already in flight");
            return false;
        }

        let guard = RefreshGuard {
            inner: Arc::clone(&self.inner),
        };
        let directory = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            match directory.refresh_cache().await {
                Ok(entry) => debug!(count = entry.printers.len(), "background refresh done"),
                Err(e) => warn!(error = %e, "background printer refresh failed; serving stale data"),
            }
        });
        true
    }

    fn is_stale(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        entry.age(now) > self.inner.config.staleness_threshold()
    }

    async fn entry_or_populate(&self) -> Result<CacheEntry> {
        match self.read_entry().await? {
            Some(entry) => Ok(entry),
            None => self.refresh_cache().await,
        }
    }

    /// Read the slot.  An entry that no longer deserializes is treated as
    /// absent so it gets rewritten.
    async fn read_entry(&self) -> Result<Option<CacheEntry>> {
        let Some(raw) = self.inner.store.get(&self.inner.config.key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

}

/// `now`, unless the clock has stepped back behind the last committed stamp.
fn next_stamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}
