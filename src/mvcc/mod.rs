//! # Multi-Version Concurrency Control (MVCC) Services
//!
//! The transaction-side services the version engine consumes. None of them
//! rebuild versions themselves; they answer the questions the engine asks
//! while walking a row's history.
//!
//! ## Version Storage: Inline Newest + Undo Log
//!
//! The newest version of a row lives in the clustered record. Older versions
//! exist only implicitly: the record's roll pointer names the undo record
//! that, applied to it, yields the version before it.
//!
//! ```text
//!        [ Clustered Record ]
//!        +-----------------------------+
//!        |  [RecordHeader]             |
//!        |    Flags:   0x00            |
//!        |    TrxId:   105             |
//!        |    RollPtr: undo:64  ---------\
//!        |  [Fields: 1, "Alice", 30]   |  \
//!        +-----------------------------+   \
//!                                           \   [ Undo Log ]
//!                                            \  +----------------------+
//!                                             ->| undo 64 (Update)     |
//!                                               |  trx 105             |
//!                                               |  old trx 100         |
//!                                               |  old roll insert:12  |
//!                                               |  field 2: 29         |
//!                                               +----------------------+
//! ```
//!
//! ## Key Structures
//!
//! - `TrxId`: 8-byte transaction identifier (u64), 0 = bootstrapped row
//! - [`TrxSys`]: id assignment, active set, read-view registry
//! - [`ReadView`]: snapshot boundary, `changes_visible(trx_id, table)`
//! - [`PurgeSys`] / [`PurgeLatch`]: the purge horizon and its latch token
//! - [`UndoRecord`]: decoded undo record
//! - [`UndoStore`] / [`UndoLog`]: where undo records are read from
//! - [`MvccTable`]: writes versions and their undo (the producer side)

pub mod purge;
pub mod read_view;
pub mod table;
pub mod transaction;
pub mod undo_log;
pub mod undo_record;

pub type TrxId = u64;

pub use purge::{PurgeLatch, PurgeSys};
pub use read_view::ReadView;
pub use table::MvccTable;
pub use transaction::{Trx, TrxHandle, TrxState, TrxSys};
pub use undo_log::{UndoLog, UndoStore};
pub use undo_record::{UndoField, UndoKind, UndoRecord, UndoVcol};
