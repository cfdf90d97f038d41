//! Worker lifecycle state and its persisted record

use crate::error::{SwError, SwResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Registered, nothing run yet
    Parsed,
    Installing,
    /// Seeded and waiting to activate
    Installed,
    Activating,
    /// Intercepting fetches
    Activated,
    /// Install failed; this version will never serve
    Redundant,
}

impl WorkerState {
    /// Whether fetches are routed through the worker
    pub fn controls_fetches(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Persisted lifecycle record, so separate host processes agree on which
/// version is installed and active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Version token of the recorded worker
    pub version: String,

    /// Last known state
    pub state: WorkerState,

    /// When install last succeeded
    pub installed_at: Option<DateTime<Utc>>,

    /// When activation last completed
    pub activated_at: Option<DateTime<Utc>>,
}

impl WorkerRecord {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            state: WorkerState::Parsed,
            installed_at: None,
            activated_at: None,
        }
    }

    /// Move to a new state, stamping install and activation times
    pub fn transition(&mut self, state: WorkerState) {
        match state {
            WorkerState::Installed => self.installed_at = Some(Utc::now()),
            WorkerState::Activated => self.activated_at = Some(Utc::now()),
            _ => {}
        }
        self.state = state;
    }

    /// State to resume a worker of `version` in.
    /// A record for another version says nothing about this one.
    pub fn state_for(&self, version: &str) -> WorkerState {
        if self.version == version {
            self.state
        } else {
            WorkerState::Parsed
        }
    }

    /// Load a record from file
    pub async fn load(path: &Path) -> SwResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SwError::io(format!("reading worker record {}", path.display()), e))?;

        let record: Self = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record to file
    pub async fn save(&self, path: &Path) -> SwResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SwError::io(format!("creating {}", parent.display()), e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| SwError::io(format!("writing worker record {}", path.display()), e))
    }
}
