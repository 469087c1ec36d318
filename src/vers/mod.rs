//! # Row Version Reconstruction
//!
//! Given the current clustered record of a row and the undo history behind
//! it, this module rebuilds the version of the row some reader should see.
//! It is the core of snapshot isolation, semi-consistent reads, implicit
//! lock discovery and safe purge of secondary-index entries.
//!
//! ## Architecture
//!
//! ```text
//!  consistent read     semi-consistent read    implicit lock    purge check
//!  (read.rs)           (read.rs)               (implicit_lock)  (purge.rs)
//!        \                    |                     |              /
//!         \___________________|_____________________|_____________/
//!                                      │
//!                                      ▼
//!                            VersionWalker (walker.rs)
//!                 two version buffers, virtual row per version
//!                                      │
//!                  ┌───────────────────┼────────────────────┐
//!                  ▼                   ▼                    ▼
//!           VersionBuilder      vcol::materialize     matcher::matches
//!           (builder.rs)        (vcol.rs)             (matcher.rs)
//!           undo -> predecessor base columns -> vcols  version vs entry
//! ```
//!
//! ## Entry Points
//!
//! | Method | Answers |
//! |--------|---------|
//! | [`RowVers::build_for_consistent_read`] | newest version visible to a read view |
//! | [`RowVers::build_for_semi_consistent_read`] | newest version committed right now |
//! | [`RowVers::implicit_lock`] | active transaction owning a secondary record |
//! | [`RowVers::old_has_index_entry`] | may purge remove a secondary entry? |
//!
//! ## Context
//!
//! There are no global singletons. Every call goes through a `RowVers`
//! holding the transaction table, the purge system and the three
//! collaborator services. The caller is expected to hold the latch of the
//! page that holds the clustered record for the whole call. The purge check
//! takes the purge latch itself, after the page latch, and holds it until it
//! returns.
//!
//! ## Memory
//!
//! A walk owns two version buffers (current and predecessor) that swap
//! roles every step, an undo buffer and a scratch arena reset before every
//! step. No version outlives the call unless a read builder copies it into
//! the caller's output arena.

pub mod builder;
pub mod implicit_lock;
pub mod matcher;
pub mod purge;
pub mod read;
pub mod vcol;
pub mod walker;

pub use builder::{BuildOutcome, VersionBuilder};
pub use matcher::{matches, matches_binary, MatchResult};
pub use read::ConsistentVersion;
pub use vcol::{fill_missing, materialize};
pub use walker::{Step, StopDecision, VersionWalker, WalkOutcome};

use crate::error::VersionError;
use crate::mvcc::{PurgeLatch, PurgeSys, TrxSys, UndoStore};
use crate::schema::{TableDef, VirtualEvaluator};
use crate::storage::ExternStore;

/// Selects whether building a predecessor first consults the purge view.
#[derive(Clone, Copy)]
pub enum BuildMode<'a> {
    /// Always read undo. Missing undo is reported as missing history.
    Read,
    /// A version whose transaction the purge view already sees is treated
    /// as having no predecessor: its undo may be gone.
    CheckPurgeability(&'a PurgeLatch<'a>),
}

pub struct RowVers<'a, U, X, E> {
    trx_sys: &'a TrxSys,
    purge: &'a PurgeSys,
    undo: &'a U,
    ext: &'a X,
    eval: &'a E,
}

impl<'a, U: UndoStore, X: ExternStore, E: VirtualEvaluator> RowVers<'a, U, X, E> {
    pub fn new(
        trx_sys: &'a TrxSys,
        purge: &'a PurgeSys,
        undo: &'a U,
        ext: &'a X,
        eval: &'a E,
    ) -> Self {
        Self {
            trx_sys,
            purge,
            undo,
            ext,
            eval,
        }
    }

    pub fn trx_sys(&self) -> &TrxSys {
        self.trx_sys
    }

    pub fn purge_sys(&self) -> &PurgeSys {
        self.purge
    }

    /// Starts a walk backwards from `rec`.
    pub fn walker<'w>(
        &'w self,
        table: &'w TableDef,
        rec: &[u8],
        mode: BuildMode<'w>,
        want_virtual: bool,
    ) -> Result<VersionWalker<'w, U, X, E>, VersionError> {
        VersionWalker::new(
            table,
            self.undo,
            self.ext,
            self.eval,
            rec,
            mode,
            want_virtual,
        )
    }
}
