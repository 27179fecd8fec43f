use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashSet;

use crate::error::{AppError, Result};
use crate::types::Team;

// ---------------------------------------------------------------------------
// SelectionState
// ---------------------------------------------------------------------------

/// Teams already spent this season. Only grows; a team is never returned.
///
/// Owned by the driver and lent read-only to the optimizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    used: BTreeSet<Team>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from picks made in earlier weeks. A duplicate in the input is a
    /// double-use and fails the same way `use_team` would.
    pub fn from_used<I: IntoIterator<Item = Team>>(teams: I) -> Result<Self> {
        let mut state = Self::new();
        for team in teams {
            state.use_team(team)?;
        }
        Ok(state)
    }

    /// Mark `team` as consumed. Using a team twice is a caller bug.
    pub fn use_team(&mut self, team: Team) -> Result<()> {
        if !self.used.insert(team) {
            return Err(AppError::AlreadyUsed(team));
        }
        Ok(())
    }

    pub fn is_available(&self, team: Team) -> bool {
        !self.used.contains(&team)
    }

    pub fn used(&self) -> impl Iterator<Item = Team> + '_ {
        self.used.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }
}

// ---------------------------------------------------------------------------
// SharedSelectionState
// ---------------------------------------------------------------------------

/// Concurrent variant. `use_team` is a single atomic check-and-insert, so two
/// callers racing on the same team cannot both succeed.
#[derive(Debug, Default)]
pub struct SharedSelectionState {
    used: DashSet<Team>,
}

impl SharedSelectionState {
    pub fn from_used<I: IntoIterator<Item = Team>>(teams: I) -> Result<Arc<Self>> {
        let seeded = SelectionState::from_used(teams)?;
        Ok(Arc::new(Self { used: seeded.used().collect() }))
    }

    pub fn use_team(&self, team: Team) -> Result<()> {
        if !self.used.insert(team) {
            return Err(AppError::AlreadyUsed(team));
        }
        Ok(())
    }

    /// Point-in-time copy for an optimizer run.
    pub fn snapshot(&self) -> SelectionState {
        SelectionState { used: self.used.iter().map(|t| *t.key()).collect() }
    }
}

// ---------------------------------------------------------------------------
// SelectionStore
// ---------------------------------------------------------------------------

/// Where a driver keeps spent teams. Planning reads a snapshot; recording a
/// pick must reject a team that is already spent.
pub trait SelectionStore {
    fn snapshot(&self) -> SelectionState;
    fn record(&mut self, team: Team) -> Result<()>;
}

impl SelectionStore for SelectionState {
    fn snapshot(&self) -> SelectionState {
        self.clone()
    }

    fn record(&mut self, team: Team) -> Result<()> {
        self.use_team(team)
    }
}

/// Each clone of the handle records into the same set.
impl SelectionStore for Arc<SharedSelectionState> {
    fn snapshot(&self) -> SelectionState {
        SharedSelectionState::snapshot(self)
    }

    fn record(&mut self, team: Team) -> Result<()> {
        self.use_team(team)
    }
}
