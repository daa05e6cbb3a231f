#![no_main]
use ipdb_field::{extract_range, field_at};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let start = data[0] as usize;
    let count = data[1] as usize;
    let index = data[2] as usize;
    let raw = &data[3..];

    if let Ok(block) = extract_range(raw, start, count) {
        let tabs = block.iter().filter(|&&b| b == b'\t').count();
        assert_eq!(tabs, count.saturating_sub(1));
        let _ = field_at(block, index);
    }
});
