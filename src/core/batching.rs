use crate::domain::model::{Batch, ListenRecord, Page};

/// Concatenate page contents in ascending page order.
pub fn flatten(mut pages: Vec<Page>) -> Vec<ListenRecord> {
    pages.sort_by_key(|p| p.number);
    pages.into_iter().flat_map(|p| p.records).collect()
}

/// Slice `records` into contiguous batches of at most `batch_size`.
/// Every batch but the last is full.
pub fn partition(records: Vec<ListenRecord>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut records = records.into_iter().peekable();

    while records.peek().is_some() {
        let chunk: Vec<ListenRecord> = records.by_ref().take(batch_size).collect();
        batches.push(Batch::new(batches.len(), chunk));
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(range: std::ops::Range<usize>) -> Vec<ListenRecord> {
        range.map(|i| ListenRecord::new(json!({ "seq": i }))).collect()
    }

    fn seqs(records: &[ListenRecord]) -> Vec<u64> {
        records
            .iter()
            .map(|r| r.get("seq").and_then(|v| v.as_u64()).unwrap())
            .collect()
    }

    #[test]
    fn test_flatten_orders_by_page() {
        let pages = vec![
            Page::new(2, records(15..20)),
            Page::new(1, records(0..15)),
        ];

        let flat = flatten(pages);

        assert_eq!(seqs(&flat), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_partition_fifteen_plus_five() {
        let batches = partition(records(0..20), 10);

        assert_eq!(batches.len(), 2);
        assert_eq!(seqs(&batches[0].records), (0..10).collect::<Vec<_>>());
        assert_eq!(seqs(&batches[1].records), (10..20).collect::<Vec<_>>());
        assert_eq!(batches[1].index, 1);
    }

    #[test]
    fn test_partition_last_batch_holds_remainder() {
        let batches = partition(records(0..23), 10);
        let sizes: Vec<_> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![10, 10, 3]);

        let batches = partition(records(0..15), 10);
        let sizes: Vec<_> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![10, 5]);
    }

    #[test]
    fn test_partition_exact_multiple() {
        let batches = partition(records(0..30), 10);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 10));
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_partition_zero_cap_is_treated_as_one() {
        let batches = partition(records(0..3), 0);
        assert_eq!(batches.len(), 3);
    }
}
