//! Durable per-file workflow state.
//!
//! The state file is a human-readable JSON mapping of output filename to the
//! success flag of each stage plus any recorded error messages. It is
//! rewritten after every single-file update and is the sole resumability
//! mechanism: a stage recorded successful for a file is never re-run.
//!
//! Workers never touch the file themselves. They send updates over a channel
//! to a single writer thread owning the [`StateStore`], so true parallel
//! writers cannot lose updates. The orchestrator obtains a consistent
//! snapshot between stages with [`StateWriter::checkpoint`].

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Recorded stages, in required order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Converted,
    Filtered,
    Deduplicated,
    Standardized,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Converted => "converted",
            Stage::Filtered => "filtered",
            Stage::Deduplicated => "deduplicated",
            Stage::Standardized => "standardized",
        }
    }

    pub fn all() -> [Stage; 4] {
        [
            Stage::Converted,
            Stage::Filtered,
            Stage::Deduplicated,
            Stage::Standardized,
        ]
    }

    /// The stage that must be recorded successful before this one runs.
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Stage::Converted => None,
            Stage::Filtered => Some(Stage::Converted),
            Stage::Deduplicated => Some(Stage::Filtered),
            Stage::Standardized => Some(Stage::Deduplicated),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum StateError {
    #[error("failed to persist state file: {0}")]
    Persist(String),

    #[error("state writer disconnected")]
    Disconnected,
}

/// Per-file stage flags and error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    pub converted: bool,
    pub filtered: bool,
    pub deduplicated: bool,
    pub standardized: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl FileState {
    pub fn stage_done(&self, stage: Stage) -> bool {
        match stage {
            Stage::Converted => self.converted,
            Stage::Filtered => self.filtered,
            Stage::Deduplicated => self.deduplicated,
            Stage::Standardized => self.standardized,
        }
    }

    fn set_stage(&mut self, stage: Stage, success: bool, error: Option<String>) {
        let flag = match stage {
            Stage::Converted => &mut self.converted,
            Stage::Filtered => &mut self.filtered,
            Stage::Deduplicated => &mut self.deduplicated,
            Stage::Standardized => &mut self.standardized,
        };
        *flag = success;
        if success {
            self.errors.remove(stage.as_str());
        } else {
            self.errors.insert(
                stage.as_str().to_string(),
                error.unwrap_or_else(|| "unknown error".to_string()),
            );
        }
    }

    /// True once every stage is recorded successful.
    pub fn complete(&self) -> bool {
        Stage::all().iter().all(|s| self.stage_done(*s))
    }

    /// Names of stages recorded as failed, in stage order.
    pub fn failed_stages(&self) -> Vec<&'static str> {
        Stage::all()
            .iter()
            .filter(|s| self.errors.contains_key(s.as_str()))
            .map(|s| s.as_str())
            .collect()
    }
}

pub type StateMap = BTreeMap<String, FileState>;

/// Owner of the state mapping and its on-disk form.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    files: StateMap,
}

impl StateStore {
    /// Loads persisted state, treating an absent or corrupt file as empty.
    /// A corrupt read is logged and never fatal.
    pub fn load(path: &Path) -> Self {
        let files = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(files) => files,
                Err(e) => {
                    warn!(
                        "state file {} is corrupt, starting empty: {}",
                        path.display(),
                        e
                    );
                    StateMap::new()
                }
            },
            Err(_) => StateMap::new(),
        };
        StateStore {
            path: path.to_path_buf(),
            files,
        }
    }

    /// Removes any persisted state for a fresh run.
    pub fn clear(path: &Path) {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                warn!("could not remove state file {}: {}", path.display(), e);
            } else {
                info!("removed previous state file {}", path.display());
            }
        }
    }

    /// Records one stage result and persists the full mapping immediately.
    pub fn update(
        &mut self,
        filename: &str,
        stage: Stage,
        success: bool,
        error: Option<String>,
    ) -> Result<(), StateError> {
        self.files
            .entry(filename.to_string())
            .or_default()
            .set_stage(stage, success, error);
        self.save()
    }

    /// Durably rewrites the state file via temp-and-rename, so a crash never
    /// leaves a half-written mapping behind.
    pub fn save(&self) -> Result<(), StateError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let write = || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(dir)?;
            serde_json::to_writer_pretty(&mut tmp, &self.files)?;
            tmp.flush()?;
            tmp.persist(&self.path).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| StateError::Persist(e.to_string()))
    }

    pub fn get(&self, filename: &str) -> Option<&FileState> {
        self.files.get(filename)
    }

    pub fn files(&self) -> &StateMap {
        &self.files
    }
}

enum StateMessage {
    Update {
        filename: String,
        stage: Stage,
        success: bool,
        error: Option<String>,
    },
    Checkpoint(Sender<Result<StateMap, StateError>>),
}

/// Cloneable sending side handed to workers. One handle per in-flight file,
/// so no `Sync` requirement leaks into the pool.
#[derive(Clone)]
pub struct StateHandle {
    tx: Sender<StateMessage>,
}

impl StateHandle {
    /// Records a stage result. `error` of `None` means success and clears any
    /// previously recorded message for that stage.
    pub fn record(&self, filename: &str, stage: Stage, error: Option<String>) {
        let msg = StateMessage::Update {
            filename: filename.to_string(),
            stage,
            success: error.is_none(),
            error,
        };
        if self.tx.send(msg).is_err() {
            error!("state writer is gone, dropping update for {}", filename);
        }
    }
}

/// Single writer thread draining worker updates.
pub struct StateWriter {
    tx: Sender<StateMessage>,
    thread: thread::JoinHandle<StateStore>,
}

impl StateWriter {
    pub fn spawn(store: StateStore) -> Self {
        let (tx, rx) = mpsc::channel();
        let thread = thread::spawn(move || Self::drain(store, rx));
        StateWriter { tx, thread }
    }

    fn drain(mut store: StateStore, rx: Receiver<StateMessage>) -> StateStore {
        let mut persist_error: Option<StateError> = None;
        for msg in rx {
            match msg {
                StateMessage::Update {
                    filename,
                    stage,
                    success,
                    error,
                } => {
                    if let Err(e) = store.update(&filename, stage, success, error) {
                        error!("{}", e);
                        persist_error.get_or_insert(e);
                    }
                }
                StateMessage::Checkpoint(reply) => {
                    let result = match persist_error.take() {
                        Some(e) => Err(e),
                        None => Ok(store.files().clone()),
                    };
                    // orchestrator may already have given up
                    let _ = reply.send(result);
                }
            }
        }
        store
    }

    pub fn handle(&self) -> StateHandle {
        StateHandle {
            tx: self.tx.clone(),
        }
    }

    /// Round-trips through the writer thread: returns the state as of every
    /// update sent before this call, or the first persistence failure, which
    /// is fatal to the run.
    pub fn checkpoint(&self) -> Result<StateMap, StateError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(StateMessage::Checkpoint(reply_tx))
            .map_err(|_| StateError::Disconnected)?;
        reply_rx.recv().map_err(|_| StateError::Disconnected)?
    }

    /// Shuts the writer down and returns the final store.
    pub fn finish(self) -> Result<StateStore, StateError> {
        drop(self.tx);
        self.thread.join().map_err(|_| StateError::Disconnected)
    }
}
