//! Ticket state names
//!
//! Loaded once before the filesystem is mounted and never refreshed: a state
//! added in Zammad afterwards reads as an empty `state` file until restart.

use crate::error::Result;
use crate::zammad::{TicketBackend, TicketState};
use std::collections::HashMap;
use tracing::info;

/// Immutable state id -> display name table
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    names: HashMap<u64, String>,
}

impl StateTable {
    /// Fetch the state list from Zammad
    pub async fn load(backend: &dyn TicketBackend) -> Result<Self> {
        let states = backend.list_states().await?;
        info!("Loaded {} ticket states", states.len());
        Ok(Self::from_states(states))
    }

    pub fn from_states(states: impl IntoIterator<Item = TicketState>) -> Self {
        StateTable {
            names: states.into_iter().map(|s| (s.id, s.name)).collect(),
        }
    }

    /// Display name for a state id, empty when unknown
    pub fn name(&self, id: u64) -> &str {
        self.names.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries sorted by id
    pub fn entries(&self) -> Vec<(u64, &str)> {
        let mut entries: Vec<_> = self.names.iter().map(|(id, n)| (*id, n.as_str())).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}
