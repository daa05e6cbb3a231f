// Properties of range extraction and field selection over generated records

use ipdb_field::{extract_range, field_at, FieldError};
use proptest::prelude::*;

/// Field contents never contain the delimiter
fn field() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no tab", |b| *b != b'\t'), 0..12)
}

fn fields(max: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(field(), 1..max)
}

/// Fields plus a range that fits inside them
fn covered_range() -> impl Strategy<Value = (Vec<Vec<u8>>, usize, usize)> {
    fields(16).prop_flat_map(|fields| {
        let len = fields.len();
        (Just(fields), 0..=len).prop_flat_map(move |(fields, start)| {
            (Just(fields), Just(start), 0..=len - start)
        })
    })
}

/// Fields plus a non-empty range that runs past their end
fn overrun_range() -> impl Strategy<Value = (Vec<Vec<u8>>, usize, usize)> {
    fields(16).prop_flat_map(|fields| {
        let len = fields.len();
        (Just(fields), 0..len + 4).prop_flat_map(move |(fields, start)| {
            let min = (len + 1).saturating_sub(start).max(1);
            (Just(fields), Just(start), min..min + 8)
        })
    })
}

fn indexed_field() -> impl Strategy<Value = (Vec<Vec<u8>>, usize)> {
    fields(16).prop_flat_map(|fields| {
        let len = fields.len();
        (Just(fields), 0..len)
    })
}

proptest! {
    #[test]
    fn extract_range_returns_joined_segments((fields, start, count) in covered_range()) {
        let raw = fields.join(&b'\t');
        // A lone empty field is an empty record, which holds no fields
        prop_assume!(!raw.is_empty());

        let expected = fields[start..start + count].join(&b'\t');
        let block = extract_range(&raw, start, count).unwrap();
        prop_assert_eq!(block, expected.as_slice());
    }

    #[test]
    fn extract_range_rejects_short_records((fields, start, count) in overrun_range()) {
        let raw = fields.join(&b'\t');

        let is_malformed = matches!(
            extract_range(&raw, start, count),
            Err(FieldError::MalformedRecord { .. })
        );
        prop_assert!(is_malformed);
    }

    #[test]
    fn field_at_selects_segment((fields, index) in indexed_field()) {
        let block = fields.join(&b'\t');
        prop_assert_eq!(field_at(&block, index).unwrap(), fields[index].as_slice());
    }

    #[test]
    fn field_at_tolerates_one_past_end(fields in fields(16)) {
        let block = fields.join(&b'\t');
        let last = fields.len() - 1;

        prop_assert_eq!(
            field_at(&block, last + 1).unwrap(),
            field_at(&block, last).unwrap()
        );
        let is_out_of_range = matches!(
            field_at(&block, last + 2),
            Err(FieldError::FieldIndexOutOfRange { .. })
        );
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn field_at_is_repeatable(fields in fields(8), index in 0usize..8) {
        let block = fields.join(&b'\t');
        let copy = block.clone();

        let first = field_at(&block, index).map(<[u8]>::to_vec).ok();
        let second = field_at(&copy, index).map(<[u8]>::to_vec).ok();
        prop_assert_eq!(first, second);
        prop_assert_eq!(block, copy);
    }
}
