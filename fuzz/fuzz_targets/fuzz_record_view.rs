//! Fuzz testing for clustered and secondary record views.
//!
//! Records come from latched pages and are trusted for layout, but a view
//! over damaged bytes must fail with an error instead of panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rowvers::record::RecordView;
use rowvers::row::IndexEntry;

fuzz_target!(|data: &[u8]| {
    let Ok(view) = RecordView::new(data) else {
        return;
    };
    let _ = view.trx_id();
    let _ = view.roll_ptr().is_insert();
    let _ = view.is_delete_marked();
    for i in 0..view.n_fields() {
        let _ = view.field(i);
    }
    if let Ok(entry) = IndexEntry::from_record(&view) {
        let _ = IndexEntry::from_record(&RecordView::new(&entry.to_record()).unwrap());
    }
});
