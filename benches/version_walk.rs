//! Version walk benchmarks for rowvers
//!
//! These benchmarks measure how reconstruction cost grows with the length of
//! the undo chain a reader or purge has to walk.

use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rowvers::mvcc::{MvccTable, PurgeSys, TrxSys, UndoLog};
use rowvers::schema::{
    ColumnDef, ExprEvaluator, GeneratedExpr, IndexDef, IndexField, TableDef, VirtualColumnDef,
};
use rowvers::storage::MemoryExternStore;
use rowvers::types::{DataType, OwnedValue};
use rowvers::{IndexEntry, ReadView, RowVers};
use std::sync::Arc;

fn table() -> TableDef {
    TableDef::new(
        1,
        "bench",
        vec![
            ColumnDef::new("id", DataType::Int8),
            ColumnDef::new("b", DataType::Int8),
            ColumnDef::new("note", DataType::Text),
        ],
    )
    .with_virtual_column(VirtualColumnDef::new(
        "b1",
        DataType::Int8,
        GeneratedExpr::add(
            GeneratedExpr::column(1),
            GeneratedExpr::Literal(OwnedValue::Int(1)),
        ),
    ))
    .with_index(IndexDef::new("idx_b", vec![IndexField::stored(1)]))
    .with_index(IndexDef::new("idx_b1", vec![IndexField::virtual_col(0)]))
}

struct Chain {
    table: TableDef,
    trx_sys: TrxSys,
    purge: PurgeSys,
    log: UndoLog,
    ext: MemoryExternStore,
}

impl Chain {
    /// A row updated `len` times by committed transactions, with a read
    /// view opened right after the insert.
    fn build(len: i64) -> (Self, Vec<u8>, Arc<ReadView>) {
        let chain = Self {
            table: table(),
            trx_sys: TrxSys::new(),
            purge: PurgeSys::new(),
            log: UndoLog::new(),
            ext: MemoryExternStore::new(),
        };
        let rows = MvccTable::new(&chain.table, &chain.log, &chain.ext, &ExprEvaluator);

        let trx = chain.trx_sys.begin();
        let mut rec = rows
            .insert(&trx, &[OwnedValue::Int(1), OwnedValue::Int(0), "n".into()])
            .unwrap();
        chain.trx_sys.commit(trx.id()).unwrap();
        let view = chain.trx_sys.open_read_view(None);

        for i in 1..=len {
            let trx = chain.trx_sys.begin();
            let change = if i % 2 == 0 {
                (1, OwnedValue::Int(i))
            } else {
                (2, OwnedValue::text(format!("n{i}")))
            };
            rec = rows.update(&trx, &rec, &[change]).unwrap();
            chain.trx_sys.commit(trx.id()).unwrap();
        }
        chain.purge.advance(&chain.trx_sys);
        (chain, rec, view)
    }

    fn vers(&self) -> RowVers<'_, UndoLog, MemoryExternStore, ExprEvaluator> {
        RowVers::new(&self.trx_sys, &self.purge, &self.log, &self.ext, &ExprEvaluator)
    }
}

fn bench_consistent_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("consistent_read");

    for len in [1i64, 16, 256] {
        let (chain, rec, view) = Chain::build(len);
        let vers = chain.vers();

        group.bench_with_input(BenchmarkId::new("stored", len), &len, |b, _| {
            let mut arena = Bump::new();
            b.iter(|| {
                let found = vers
                    .build_for_consistent_read(&chain.table, black_box(&rec), &view, false, &arena)
                    .unwrap();
                black_box(found.map(|v| v.record.len()));
                arena.reset();
            });
        });

        group.bench_with_input(BenchmarkId::new("with_virtual", len), &len, |b, _| {
            let mut arena = Bump::new();
            b.iter(|| {
                let found = vers
                    .build_for_consistent_read(&chain.table, black_box(&rec), &view, true, &arena)
                    .unwrap();
                black_box(found.map(|v| v.vrow));
                arena.reset();
            });
        });
    }

    group.finish();
}

fn bench_purge_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("old_has_index_entry");

    for len in [1i64, 16, 256] {
        let (chain, rec, _view) = Chain::build(len);
        let vers = chain.vers();
        let index = chain.table.index("idx_b").unwrap();
        let oldest = IndexEntry::new(vec![OwnedValue::Int(0), OwnedValue::Int(1)]);

        group.bench_with_input(BenchmarkId::new("oldest_entry", len), &len, |b, _| {
            b.iter(|| {
                black_box(
                    vers.old_has_index_entry(&chain.table, true, black_box(&rec), index, &oldest)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_consistent_read, bench_purge_check);
criterion_main!(benches);
