// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed rules service.
//!
//! Each task queue lives in its own JSON file under `<state_dir>/queues/`.
//! Reads and updates hold an exclusive lock on a sibling `.lock` file, so
//! concurrent `tq` processes see the same conflict-token protocol a remote
//! service would enforce. File work runs on tokio's blocking pool once the
//! lock is held. Writes go to a temp file that is renamed into
//! place, so a crash never leaves a half-written rule set behind.

use async_trait::async_trait;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace};
use tq_core::{
    apply, ApplyContext, Clock, ConflictToken, Operation, RuleSet, RulesClient, RulesError,
    SystemClock,
};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::state::{PollerRecord, QueueState};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt rules state {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid store config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("state file {} belongs to task queue '{found}', not '{expected}'", path.display())]
    QueueMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

impl From<StoreError> for RulesError {
    fn from(e: StoreError) -> Self {
        RulesError::transport(e.to_string())
    }
}

/// How long to wait between attempts on a contended queue lock.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Local rules service rooted at a state directory.
#[derive(Clone)]
pub struct LocalRulesStore {
    queues_dir: PathBuf,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl LocalRulesStore {
    /// Open the store, reading `config.toml` if present.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let config = StoreConfig::load(&state_dir.join("config.toml"))?;
        Self::with_config(state_dir, config)
    }

    pub fn with_config(state_dir: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        let queues_dir = state_dir.join("queues");
        fs::create_dir_all(&queues_dir)?;
        debug!(dir = %queues_dir.display(), "opened rules store");
        Ok(Self {
            queues_dir,
            config,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record a worker poll for `build_id` on `task_queue`.
    pub async fn record_poller(&self, task_queue: &str, build_id: &str) -> Result<(), StoreError> {
        let queue = task_queue.to_string();
        let build_id = build_id.to_string();
        self.with_queue(task_queue, move |store, path| {
            let mut state = store.load_or_init(path, &queue)?;
            state.pollers.insert(build_id.clone(), store.clock.now());
            save(path, &state)?;
            info!(task_queue = %queue, build_id = %build_id, "recorded poller");
            Ok(())
        })
        .await
    }

    /// Pollers seen on `task_queue`, most recent first.
    pub async fn pollers(&self, task_queue: &str) -> Result<Vec<PollerRecord>, StoreError> {
        let queue = task_queue.to_string();
        self.with_queue(task_queue, move |store, path| {
            let state = store.load_or_init(path, &queue)?;
            let now = store.clock.now();
            let window = store.config.poller_window();
            let mut records: Vec<PollerRecord> = state
                .pollers
                .iter()
                .map(|(build_id, seen)| PollerRecord {
                    build_id: build_id.clone(),
                    last_seen: *seen,
                    recent: state.has_recent_poller(build_id, now, window),
                })
                .collect();
            records.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
            Ok(records)
        })
        .await
    }

    /// `queues/<first 16 bytes of sha256(name)>.json`; queue names may hold
    /// characters that are not valid in file names.
    fn queue_path(&self, task_queue: &str) -> PathBuf {
        let digest = Sha256::digest(task_queue.as_bytes());
        let name: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
        self.queues_dir.join(format!("{}.json", name))
    }

    /// Take the queue's exclusive lock. Released when the returned file drops.
    ///
    /// Polls `try_lock_exclusive` so a caller racing this future against a
    /// timeout or Ctrl-C can abandon the wait.
    async fn lock_queue(&self, path: &Path) -> Result<File, StoreError> {
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    trace!(path = %lock_path.display(), "queue lock held, retrying");
                    tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                }
                Err(source) => {
                    return Err(StoreError::Lock {
                        path: lock_path,
                        source,
                    })
                }
            }
        }
    }

    /// Run `f` on the blocking pool while holding the queue's lock.
    async fn with_queue<T, E, F>(&self, task_queue: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&LocalRulesStore, &Path) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let path = self.queue_path(task_queue);
        let lock = self.lock_queue(&path).await?;
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let _lock = lock;
            f(&store, &path)
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    fn load_or_init(&self, path: &Path, task_queue: &str) -> Result<QueueState, StoreError> {
        if !path.exists() {
            let state = QueueState::new(task_queue, fresh_token());
            save(path, &state)?;
            debug!(task_queue, "initialized empty rule set");
            return Ok(state);
        }

        let reader = BufReader::new(File::open(path)?);
        let state: QueueState =
            serde_json::from_reader(reader).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        if state.task_queue != task_queue {
            return Err(StoreError::QueueMismatch {
                path: path.to_path_buf(),
                expected: task_queue.to_string(),
                found: state.task_queue,
            });
        }
        Ok(state)
    }

    fn apply_update(
        &self,
        path: &Path,
        task_queue: &str,
        token: &ConflictToken,
        op: &Operation,
    ) -> Result<RuleSet, RulesError> {
        let mut state = self.load_or_init(path, task_queue)?;

        if state.conflict_token != *token {
            debug!(task_queue, version = state.version, "rejecting stale token");
            return Err(RulesError::Conflict);
        }

        let now = self.clock.now();
        let window = self.config.poller_window();
        let has_recent_pollers = |build_id: &str| state.has_recent_poller(build_id, now, window);
        let ctx = ApplyContext {
            now,
            limits: self.config.limits(),
            has_recent_pollers: &has_recent_pollers,
        };
        let rules = apply(&state.rules, op, &ctx)?;

        state.rules = rules;
        state.version += 1;
        state.conflict_token = fresh_token();
        save(path, &state)?;

        info!(task_queue, op = op.name(), version = state.version, "applied update");
        Ok(state.rule_set())
    }
}

#[async_trait]
impl RulesClient for LocalRulesStore {
    async fn get_rules(&self, task_queue: &str) -> Result<RuleSet, RulesError> {
        let queue = task_queue.to_string();
        self.with_queue(task_queue, move |store, path| {
            let state = store.load_or_init(path, &queue)?;
            Ok(state.rule_set())
        })
        .await
    }

    async fn update_rules(
        &self,
        task_queue: &str,
        token: &ConflictToken,
        op: Operation,
    ) -> Result<RuleSet, RulesError> {
        let queue = task_queue.to_string();
        let token = token.clone();
        self.with_queue(task_queue, move |store, path| {
            store.apply_update(path, &queue, &token, &op)
        })
        .await
    }
}

fn fresh_token() -> ConflictToken {
    ConflictToken::from_bytes(Uuid::new_v4().as_bytes().to_vec())
}

/// Save state atomically (write to .tmp, then rename).
fn save(path: &Path, state: &QueueState) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
