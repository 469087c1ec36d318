//! # rowvers - Row Version Reconstruction
//!
//! rowvers rebuilds earlier versions of clustered-index records from undo
//! history. A storage engine that updates rows in place keeps only the
//! newest version on the page; every older version is one undo record away.
//! This crate answers the questions readers, lockers and purge ask of that
//! history:
//!
//! - **Consistent read**: which version does this snapshot see?
//! - **Semi-consistent read**: what is the latest committed version?
//! - **Implicit locks**: does an active writer own this secondary record?
//! - **Purge safety**: may this delete-marked secondary entry be removed?
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowvers::{MvccTable, OwnedValue, PurgeSys, RowVers, TrxSys, UndoLog};
//! use rowvers::schema::ExprEvaluator;
//! use rowvers::storage::MemoryExternStore;
//!
//! let (trx_sys, purge, log, ext) =
//!     (TrxSys::new(), PurgeSys::new(), UndoLog::new(), MemoryExternStore::new());
//! let rows = MvccTable::new(&table, &log, &ext, &ExprEvaluator);
//!
//! let t1 = trx_sys.begin();
//! let v1 = rows.insert(&t1, &[OwnedValue::Int(1), "a".into()])?;
//! trx_sys.commit(t1.id())?;
//!
//! let view = trx_sys.open_read_view(None);
//! let t2 = trx_sys.begin();
//! let v2 = rows.update(&t2, &v1, &[(1, "b".into())])?;
//!
//! let vers = RowVers::new(&trx_sys, &purge, &log, &ext, &ExprEvaluator);
//! let arena = bumpalo::Bump::new();
//! let seen = vers.build_for_consistent_read(&table, &v2, &view, false, &arena)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  vers: read builders, implicit lock, purge  │
//! ├─────────────────────────────────────────────┤
//! │  walker ─> builder ─> undo store            │
//! │  matcher, virtual-column materializer       │
//! ├──────────────────────┬──────────────────────┤
//! │ mvcc: trx table,     │ schema: tables,      │
//! │ read/purge views,    │ indexes, generated   │
//! │ undo log             │ expressions          │
//! ├──────────────────────┴──────────────────────┤
//! │  record / row: clustered records, entries   │
//! ├─────────────────────────────────────────────┤
//! │  encoding, types, extern value store        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`vers`]: version walks and the four entry points
//! - [`mvcc`]: transactions, read views, purge view, undo records and log
//! - [`record`]: clustered record header and zero-copy view
//! - [`row`]: decoded rows, virtual rows, secondary-index entries
//! - [`schema`]: table, column, index and generated-column definitions
//! - [`storage`]: externally stored column values
//! - [`encoding`]: varints and value codec
//! - [`types`]: values, data types, collations

pub mod config;
pub mod encoding;
pub mod error;
pub mod mvcc;
pub mod record;
pub mod row;
pub mod schema;
pub mod storage;
pub mod types;
pub mod vers;

pub use error::VersionError;
pub use mvcc::{MvccTable, PurgeSys, ReadView, TrxId, TrxSys, UndoLog, UndoStore};
pub use record::{RecordView, RollPtr};
pub use row::{IndexEntry, VirtualRow};
pub use schema::{IndexDef, TableDef};
pub use types::{OwnedValue, Value};
pub use vers::{BuildMode, ConsistentVersion, RowVers, VersionWalker, WalkOutcome};
