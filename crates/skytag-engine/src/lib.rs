//! Skytag tagging engine
//!
//! Feeds classified tokens through a selection state machine and applies
//! mutations to the frozen selection:
//!
//! ```text
//!   token ──classify──► selection? ──yes──► select() ──► SelectionSession::select
//!                            │
//!                            no
//!                            ▼
//!              SelectionSession::materialize ──► mutate::apply ──► SkyModel
//! ```
//!
//! Selections accumulate by union until a mutation freezes them; the next
//! selection token starts a fresh one. Every step emits the fixed console
//! lines in [`report`].

pub mod error;
pub mod mutate;
pub mod report;
pub mod select;
pub mod selection;
pub mod session;
pub mod transfer;

pub use error::{Result, TagError};
pub use mutate::Mutation;
pub use select::{select, NameMatcher};
pub use selection::{Origin, SelectionSession, SelectionState};
pub use session::{process, Outcome, SessionOptions, TagSession};
pub use transfer::{transfer_tags, TransferReport};
