//! Fuzz testing for the undo record decoder.
//!
//! The version builder decodes undo bytes it did not write itself. Damaged
//! input must surface as an error, and anything that decodes must encode to
//! bytes that decode again.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rowvers::mvcc::UndoRecord;

#[derive(Debug, Arbitrary)]
struct UndoInput {
    n_virtual: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: UndoInput| {
    let Ok(undo) = UndoRecord::decode(&input.data) else {
        return;
    };
    let n_virtual = input.n_virtual as usize;
    if undo.vcols.iter().all(|v| v.vcol_no < n_virtual) {
        let old = undo.old_virtual(n_virtual);
        let new = undo.new_virtual(n_virtual);
        assert_eq!(old.all_missing(), undo.vcols.is_empty());
        assert_eq!(new.all_missing(), undo.vcols.is_empty());
    }

    let bytes = undo.to_bytes();
    let again = UndoRecord::decode(&bytes).expect("re-encoded undo record must decode");
    assert_eq!(again.undo_no, undo.undo_no);
    assert_eq!(again.update.len(), undo.update.len());
    assert_eq!(again.vcols.len(), undo.vcols.len());
});
