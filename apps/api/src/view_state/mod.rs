//! Presentation-side view state: which checklist items and roadmap steps a user
//! has ticked, keyed by artifact id.
//!
//! Artifacts themselves are immutable; completion lives here, outside the
//! engine. In-memory only, bounded, lost on restart.

pub mod handlers;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Entries kept before the least recently updated one is evicted.
pub const MAX_TRACKED_ARTIFACTS: usize = 10_000;

/// Highest item/step index a toggle may address.
pub const MAX_INDEX: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleTarget {
    Item,
    Step,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub target: ToggleTarget,
    pub index: usize,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactViewState {
    pub artifact_id: String,
    pub completed_items: BTreeSet<usize>,
    pub completed_steps: BTreeSet<usize>,
    pub updated_at: DateTime<Utc>,
}

impl ArtifactViewState {
    fn new(artifact_id: &str) -> Self {
        Self {
            artifact_id: artifact_id.to_string(),
            completed_items: BTreeSet::new(),
            completed_steps: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewStateStore {
    inner: Arc<RwLock<HashMap<String, ArtifactViewState>>>,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, artifact_id: &str) -> Option<ArtifactViewState> {
        self.inner.read().await.get(artifact_id).cloned()
    }

    /// Sets one flag. Idempotent: repeating a toggle leaves the state unchanged
    /// apart from `updated_at`.
    pub async fn apply(&self, artifact_id: &str, toggle: &ToggleRequest) -> ArtifactViewState {
        let mut states = self.inner.write().await;
        if !states.contains_key(artifact_id) && states.len() >= MAX_TRACKED_ARTIFACTS {
            evict_oldest(&mut states);
        }

        let state = states
            .entry(artifact_id.to_string())
            .or_insert_with(|| ArtifactViewState::new(artifact_id));
        let set = match toggle.target {
            ToggleTarget::Item => &mut state.completed_items,
            ToggleTarget::Step => &mut state.completed_steps,
        };
        if toggle.completed {
            set.insert(toggle.index);
        } else {
            set.remove(&toggle.index);
        }
        state.updated_at = Utc::now();
        state.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn evict_oldest(states: &mut HashMap<String, ArtifactViewState>) {
    let oldest = states
        .values()
        .min_by_key(|state| state.updated_at)
        .map(|state| state.artifact_id.clone());
    if let Some(id) = oldest {
        debug!(artifact_id = %id, "evicting view state");
        states.remove(&id);
    }
}
