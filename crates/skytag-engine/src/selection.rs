//! Selection accumulation across tokens.
//!
//! ```text
//!            select(S)                 select(S')
//!   Empty ─────────────► Accumulating ───────────► Accumulating (acc ∪ S')
//!     │                      │   ▲
//!     │ materialize()        │   │ select(S): reset acc = S
//!     ▼                      ▼   │
//!   Frozen(all) ◄──────── Frozen(acc)   materialize() again: same set
//! ```

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    /// No selection token yet: logically every source.
    Empty,
    Accumulating,
    /// A mutation has fixed the working set.
    Frozen,
}

/// Where a materialized selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// No selection token preceded the mutation.
    AllSources,
    /// The union of the selection tokens since the last reset.
    Explicit,
    /// Already frozen by an earlier mutation in the same cycle.
    Frozen,
}

#[derive(Debug, Clone)]
pub struct SelectionSession {
    state: SelectionState,
    accumulator: RoaringBitmap,
    frozen: RoaringBitmap,
    modified: bool,
}

impl Default for SelectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSession {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Empty,
            accumulator: RoaringBitmap::new(),
            frozen: RoaringBitmap::new(),
            modified: false,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Fold one selection token's matches in.
    ///
    /// Returns `true` when this started a new accumulation (first selection,
    /// or first after a mutation).
    pub fn select(&mut self, matched: &RoaringBitmap) -> bool {
        let reset = self.state != SelectionState::Accumulating;
        if reset {
            self.accumulator.clear();
            self.state = SelectionState::Accumulating;
        }
        self.accumulator |= matched;
        reset
    }

    /// Fix the working set for a mutation.
    ///
    /// `universe` supplies every source id and is only consulted when no
    /// selection token was seen. Calling again while frozen returns the same
    /// set.
    pub fn materialize(
        &mut self,
        universe: impl FnOnce() -> RoaringBitmap,
    ) -> (&RoaringBitmap, Origin) {
        let origin = match self.state {
            SelectionState::Frozen => Origin::Frozen,
            SelectionState::Empty => {
                self.frozen = universe();
                Origin::AllSources
            }
            SelectionState::Accumulating => {
                self.frozen = std::mem::take(&mut self.accumulator);
                Origin::Explicit
            }
        };
        self.state = SelectionState::Frozen;
        (&self.frozen, origin)
    }

    /// The current frozen set, if a mutation has fixed one.
    pub fn frozen(&self) -> Option<&RoaringBitmap> {
        (self.state == SelectionState::Frozen).then_some(&self.frozen)
    }

    pub fn accumulated(&self) -> &RoaringBitmap {
        &self.accumulator
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn modified(&self) -> bool {
        self.modified
    }
}
