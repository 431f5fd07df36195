//! The sparse per-job cache of produced results.

use std::sync::Arc;

use fastsync_types::WalletBlock;

/// A contiguous run of results at heights `[start, start + len)`.
///
/// A zero-length bulk is a marker: it remembers the next expected
/// height when no results are cached yet.
#[derive(Debug, Clone, Default)]
struct Bulk {
    start: u64,
    blocks: Vec<Arc<WalletBlock>>,
}

impl Bulk {
    const fn new(start: u64, blocks: Vec<Arc<WalletBlock>>) -> Self {
        Self { start, blocks }
    }

    /// One past the height of the last block in the bulk.
    fn next_height(&self) -> u64 {
        self.start + self.blocks.len() as u64
    }

    fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// An ordered sequence of non-overlapping [`Bulk`]s.
///
/// Answers "which consecutive results are cached from height H, and
/// where is the next gap" without materializing absent heights.
/// Overlapping inserts are merged; on overlap the data already in the
/// list wins, which makes re-inserting a scan result idempotent.
#[derive(Debug, Default)]
pub struct BulkList {
    bulks: Vec<Bulk>,
}

/// Where `do_add` left off: either the run was fully consumed, or
/// merging has to continue at `index` with the remainder.
enum AddStep {
    Done,
    Continue {
        index: usize,
        start: u64,
        blocks: Vec<Arc<WalletBlock>>,
    },
}

impl BulkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a run of consecutive blocks starting at `start`,
    /// merging with whatever overlaps or touches it.
    pub fn add(&mut self, start: u64, blocks: &[Arc<WalletBlock>]) {
        let mut start = start;
        let mut blocks = blocks.to_vec();

        let mut i = 0;
        while i < self.bulks.len() {
            if self.bulks[i].next_height() >= start {
                match self.do_add(i, start, blocks) {
                    AddStep::Done => return,
                    AddStep::Continue {
                        index,
                        start: s,
                        blocks: b,
                    } => {
                        i = index;
                        start = s;
                        blocks = b;
                    }
                }
                continue;
            }

            i += 1;
        }

        // Past every existing bulk.
        self.bulks.push(Bulk::new(start, blocks));
    }

    /// Delete the height range `[start, start + count)`.
    pub fn remove(&mut self, start: u64, count: usize) {
        let mut i = 0;
        while i < self.bulks.len() {
            if self.bulks[i].next_height() >= start {
                match self.do_remove(i, start, count) {
                    Some(next) => i = next,
                    None => return,
                }
                continue;
            }

            i += 1;
        }
    }

    /// Drop everything strictly above `top`.
    pub fn trim(&mut self, top: u64) {
        let mut i = 0;
        while i < self.bulks.len() {
            let bulk = &mut self.bulks[i];

            if bulk.next_height() <= top {
                i += 1;
                continue;
            }

            if bulk.start > top {
                self.bulks.remove(i);
            } else {
                // The block at `top` itself stays.
                bulk.blocks.truncate((top - bulk.start + 1) as usize);
                i += 1;
            }
        }
    }

    /// How many consecutive results are present starting exactly at
    /// `start`.
    pub fn available(&self, start: u64) -> usize {
        match self.bulks.iter().find(|b| b.next_height() > start) {
            Some(bulk) if bulk.start <= start => (bulk.next_height() - start) as usize,
            _ => 0,
        }
    }

    /// Up to `max_count` contiguous results beginning at `start`.
    pub fn get(&self, start: u64, max_count: usize) -> Vec<Arc<WalletBlock>> {
        let Some(bulk) = self.bulks.iter().find(|b| b.next_height() > start) else {
            return Vec::new();
        };

        if bulk.start > start {
            return Vec::new();
        }

        let from = (start - bulk.start) as usize;
        let to = bulk.blocks.len().min(from.saturating_add(max_count));
        bulk.blocks[from..to].to_vec()
    }

    /// Where scanning should resume: the first uncached height and
    /// the size of the gap up to the next non-empty bulk. Count zero
    /// means "open-ended": either the list is empty, there is no
    /// later data, or the tail is only a marker.
    pub fn find_missing(&self) -> (u64, usize) {
        let Some(first) = self.bulks.first() else {
            return (0, 0);
        };

        let start = first.next_height();
        let mut count = 0;

        for bulk in &self.bulks[1..] {
            count = (bulk.start - start) as usize;
            if !bulk.is_empty() {
                break;
            }
        }

        if self.bulks.last().expect("list is non-empty").is_empty() {
            count = 0;
        }

        (start, count)
    }

    fn do_add(&mut self, i: usize, start: u64, blocks: Vec<Arc<WalletBlock>>) -> AddStep {
        let bulk = &mut self.bulks[i];

        if start < bulk.start {
            if (blocks.len() as u64) < bulk.start - start {
                // Space left before this bulk, no merge needed.
                self.bulks.insert(i, Bulk::new(start, blocks));
                return AddStep::Done;
            }

            // The run reaches this bulk: its head becomes the prefix,
            // the existing data stays authoritative for the overlap.
            let overlap = (bulk.start - start) as usize;
            let old_start = bulk.start;

            let mut merged = blocks[..overlap].to_vec();
            merged.append(&mut bulk.blocks);
            bulk.start = start;
            bulk.blocks = merged;

            return AddStep::Continue {
                index: i,
                start: old_start,
                blocks: blocks[overlap..].to_vec(),
            };
        }

        let skip = (bulk.next_height() - start) as usize;
        if blocks.len() < skip {
            // Entirely inside existing data.
            return AddStep::Done;
        }

        let Some(next_start) = self.bulks.get(i + 1).map(|b| b.start) else {
            self.bulks[i].blocks.extend_from_slice(&blocks[skip..]);
            return AddStep::Done;
        };

        if start + (blocks.len() as u64) < next_start {
            self.bulks[i].blocks.extend_from_slice(&blocks[skip..]);
            return AddStep::Done;
        }

        // Fill the gap up to the next bulk, then absorb it and keep
        // going with the remainder of the run.
        let gap_end = (next_start - start) as usize;
        let mut follower = self.bulks.remove(i + 1);
        let bulk = &mut self.bulks[i];
        bulk.blocks.extend_from_slice(&blocks[skip..gap_end]);
        bulk.blocks.append(&mut follower.blocks);

        AddStep::Continue {
            index: i,
            start: next_start,
            blocks: blocks[gap_end..].to_vec(),
        }
    }

    /// Returns the next index to continue at, or `None` when the
    /// removal range cannot reach any later bulk.
    fn do_remove(&mut self, i: usize, start: u64, count: usize) -> Option<usize> {
        let bulk = &mut self.bulks[i];
        let count_u64 = count as u64;

        if start < bulk.start {
            if bulk.start - start >= count_u64 {
                return None;
            }

            let trim = (count_u64 - (bulk.start - start)) as usize;
            if bulk.blocks.len() <= trim {
                self.bulks.remove(i);
                return Some(i);
            }

            bulk.start = start + count_u64;
            bulk.blocks.drain(..trim);
            return None;
        }

        if start + count_u64 >= bulk.next_height() {
            bulk.blocks.truncate((start - bulk.start) as usize);
            if bulk.is_empty() {
                self.bulks.remove(i);
                return Some(i);
            }
            return Some(i + 1);
        }

        // The range is strictly inside: split, leaving the head
        // (possibly as an empty marker) and a tail bulk.
        let tail_from = (start + count_u64 - bulk.start) as usize;
        let tail = Bulk::new(start + count_u64, bulk.blocks[tail_from..].to_vec());
        bulk.blocks.truncate((start - bulk.start) as usize);
        self.bulks.insert(i + 1, tail);

        Some(i + 1)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    /// Test blocks are distinguished by their timestamp, which is set
    /// to the height they were generated for.
    fn blocks(start: u64, count: usize) -> Vec<Arc<WalletBlock>> {
        (0..count as u64)
            .map(|i| Arc::new(WalletBlock::skeleton([0; 32], start + i)))
            .collect()
    }

    /// The list as `(start, timestamps)` pairs for assertions.
    fn snapshot(list: &BulkList) -> Vec<(u64, Vec<u64>)> {
        list.bulks
            .iter()
            .map(|b| (b.start, b.blocks.iter().map(|bl| bl.timestamp).collect()))
            .collect()
    }

    fn run(start: u64, count: usize) -> (u64, Vec<u64>) {
        (start, (start..start + count as u64).collect())
    }

    #[test]
    fn add_single_run() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));

        assert_eq!(snapshot(&list), vec![run(10, 10)]);
    }

    #[test]
    fn add_intersecting_end() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(19, &blocks(19, 2));

        assert_eq!(snapshot(&list), vec![run(10, 11)]);
    }

    #[test]
    fn add_intersecting_start() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(8, &blocks(8, 10));

        assert_eq!(snapshot(&list), vec![run(8, 12)]);
    }

    #[test]
    fn add_inside_is_dropped() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(12, &blocks(12, 2));

        assert_eq!(snapshot(&list), vec![run(10, 10)]);
    }

    #[test]
    fn add_same_twice() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(10, &blocks(10, 10));

        assert_eq!(snapshot(&list), vec![run(10, 10)]);
    }

    #[test]
    fn add_disjoint_runs() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(30, &blocks(30, 10));

        assert_eq!(snapshot(&list), vec![run(10, 10), run(30, 10)]);
    }

    #[test]
    fn add_out_of_order_stays_sorted() {
        let mut list = BulkList::new();
        list.add(30, &blocks(30, 7));
        list.add(10, &blocks(10, 5));
        list.add(20, &blocks(20, 6));

        assert_eq!(
            snapshot(&list),
            vec![run(10, 5), run(20, 6), run(30, 7)]
        );
    }

    #[test]
    fn add_adjacent_merges_at_end() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(20, &blocks(20, 6));

        assert_eq!(snapshot(&list), vec![run(10, 16)]);
    }

    #[test]
    fn add_adjacent_merges_at_start() {
        let mut list = BulkList::new();
        list.add(20, &blocks(20, 6));
        list.add(10, &blocks(10, 10));

        assert_eq!(snapshot(&list), vec![run(10, 16)]);
    }

    // Existing data must survive an add that covers it entirely.
    #[test]
    fn add_covering_keeps_existing_data() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10).iter().map(|b| {
            Arc::new(WalletBlock::skeleton([1; 32], b.timestamp))
        }).collect::<Vec<_>>());
        list.add(5, &blocks(5, 40));

        assert_eq!(snapshot(&list), vec![run(5, 40)]);
        // The overlap region still carries the original blocks.
        for block in list.get(10, 10) {
            assert_eq!(block.hash, [1; 32]);
        }
        for block in list.get(5, 5) {
            assert_eq!(block.hash, [0; 32]);
        }
    }

    #[test]
    fn add_bridging_two_bulks() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(30, &blocks(30, 10));
        list.add(15, &blocks(15, 20));

        assert_eq!(snapshot(&list), vec![run(10, 30)]);
    }

    #[test]
    fn add_covering_two_bulks() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 5));
        list.add(20, &blocks(20, 5));
        list.add(5, &blocks(5, 25));

        assert_eq!(snapshot(&list), vec![run(5, 25)]);
    }

    #[test]
    fn add_reaching_second_bulk_boundary() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 5));
        list.add(20, &blocks(20, 5));
        list.add(5, &blocks(5, 15));

        assert_eq!(snapshot(&list), vec![run(5, 20)]);
    }

    #[test]
    fn add_onto_marker() {
        let mut list = BulkList::new();
        list.add(10, &[]);
        list.add(10, &blocks(10, 10));

        assert_eq!(snapshot(&list), vec![run(10, 10)]);
    }

    #[test]
    fn add_after_marker_leaves_it() {
        let mut list = BulkList::new();
        list.add(10, &[]);
        list.add(11, &blocks(11, 10));

        assert_eq!(snapshot(&list), vec![run(10, 0), run(11, 10)]);
    }

    #[test]
    fn add_just_before_marker_absorbs_it() {
        let mut list = BulkList::new();
        list.add(10, &[]);
        list.add(9, &blocks(9, 1));

        assert_eq!(snapshot(&list), vec![run(9, 1)]);
    }

    #[test]
    fn add_before_marker_absorbs_it() {
        let mut list = BulkList::new();
        list.add(10, &[]);
        list.add(5, &blocks(5, 10));

        assert_eq!(snapshot(&list), vec![run(5, 10)]);
    }

    #[test]
    fn add_two_markers() {
        let mut list = BulkList::new();
        list.add(10, &[]);
        list.add(9, &[]);

        assert_eq!(snapshot(&list), vec![run(9, 0), run(10, 0)]);
    }

    #[test]
    fn add_merging_three_bulks() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(30, &blocks(30, 10));
        list.add(20, &blocks(20, 10));

        assert_eq!(snapshot(&list), vec![run(10, 30)]);
    }

    #[test]
    fn add_merging_five_bulks() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.add(10, &blocks(10, 10));
        list.add(30, &blocks(30, 10));
        list.add(40, &blocks(40, 10));
        list.add(20, &blocks(20, 10));

        assert_eq!(snapshot(&list), vec![run(10, 50)]);
    }

    #[test]
    fn remove_exact() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(50, 10);

        assert_eq!(snapshot(&list), vec![]);
    }

    #[test]
    fn remove_covering() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(45, 20);

        assert_eq!(snapshot(&list), vec![]);
    }

    #[test]
    fn remove_entirely_before() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(45, 5);

        assert_eq!(snapshot(&list), vec![run(50, 10)]);
    }

    #[test]
    fn remove_entirely_after() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(60, 5);

        assert_eq!(snapshot(&list), vec![run(50, 10)]);
    }

    #[test]
    fn remove_overlapping_left() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(45, 10);

        assert_eq!(snapshot(&list), vec![run(55, 5)]);
    }

    #[test]
    fn remove_overlapping_right() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(55, 10);

        assert_eq!(snapshot(&list), vec![run(50, 5)]);
    }

    #[test]
    fn remove_middle_splits() {
        let mut list = BulkList::new();
        list.add(50, &blocks(50, 10));
        list.remove(52, 5);

        assert_eq!(snapshot(&list), vec![run(50, 2), run(57, 3)]);
    }

    #[test]
    fn remove_two_middles() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 20));
        list.remove(13, 5);
        list.remove(20, 5);

        assert_eq!(
            snapshot(&list),
            vec![run(10, 3), run(18, 2), run(25, 5)]
        );
    }

    #[test]
    fn remove_across_gap() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(25, &blocks(25, 10));
        list.remove(15, 15);

        assert_eq!(snapshot(&list), vec![run(10, 5), run(30, 5)]);
    }

    #[test]
    fn remove_across_three_bulks() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(25, &blocks(25, 10));
        list.add(40, &blocks(40, 10));
        list.remove(15, 30);

        assert_eq!(snapshot(&list), vec![run(10, 5), run(45, 5)]);
    }

    #[test]
    fn trim_below_bulk_removes_it() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.trim(9);

        assert_eq!(snapshot(&list), vec![]);
    }

    #[test]
    fn trim_below_everything() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(25, &blocks(25, 10));
        list.trim(9);

        assert_eq!(snapshot(&list), vec![]);
    }

    #[test]
    fn trim_keeps_top_inclusive() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.trim(15);

        assert_eq!(snapshot(&list), vec![run(10, 6)]);
    }

    #[test]
    fn trim_at_start_height() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.trim(10);

        assert_eq!(snapshot(&list), vec![run(10, 1)]);
    }

    #[test]
    fn trim_keeps_marker_at_or_below() {
        let mut list = BulkList::new();
        list.add(10, &[]);
        list.trim(10);

        assert_eq!(snapshot(&list), vec![run(10, 0)]);
    }

    #[test]
    fn available_on_empty_list() {
        assert_eq!(BulkList::new().available(0), 0);
    }

    #[test]
    fn available_before_first_bulk() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));

        assert_eq!(list.available(9), 0);
    }

    #[test]
    fn available_on_marker() {
        let mut list = BulkList::new();
        list.add(10, &[]);

        assert_eq!(list.available(10), 0);
    }

    #[test]
    fn available_counts_to_bulk_end() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));

        assert_eq!(list.available(10), 10);
        assert_eq!(list.available(15), 5);
        assert_eq!(list.available(20), 0);
    }

    #[test]
    fn available_in_gap() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(30, &blocks(30, 10));

        assert_eq!(list.available(20), 0);
    }

    #[test]
    fn get_on_empty_list() {
        assert_eq!(BulkList::new().get(10, 10), vec![]);
    }

    #[test]
    fn get_before_first_bulk() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));

        assert_eq!(list.get(5, 2), vec![]);
        assert_eq!(list.get(5, 10), vec![]);
        assert_eq!(list.get(20, 10), vec![]);
    }

    #[test]
    fn get_slices() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));

        assert_eq!(list.get(10, 10), blocks(10, 10));
        assert_eq!(list.get(15, 10), blocks(15, 5));
        assert_eq!(list.get(12, 2), blocks(12, 2));
        assert_eq!(list.get(12, 0), vec![]);
    }

    #[test]
    fn find_missing_on_empty_list() {
        assert_eq!(BulkList::new().find_missing(), (0, 0));
    }

    #[test]
    fn find_missing_single_bulk_is_open_ended() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));

        assert_eq!(list.find_missing(), (20, 0));
    }

    #[test]
    fn find_missing_on_marker() {
        let mut list = BulkList::new();
        list.add(10, &[]);

        assert_eq!(list.find_missing(), (10, 0));
    }

    #[test]
    fn find_missing_gap_between_bulks() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(30, &blocks(30, 10));

        assert_eq!(list.find_missing(), (20, 10));
    }

    #[test]
    fn find_missing_skips_markers_in_gap() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(25, &[]);
        list.add(30, &blocks(30, 10));

        assert_eq!(list.find_missing(), (20, 10));

        list.add(23, &[]);
        assert_eq!(list.find_missing(), (20, 10));
    }

    #[test]
    fn find_missing_trailing_marker_means_open_ended() {
        let mut list = BulkList::new();
        list.add(10, &blocks(10, 10));
        list.add(25, &[]);

        assert_eq!(list.find_missing(), (20, 0));
    }

    // Property tests over random operation sequences.

    #[derive(Debug, Clone)]
    enum Op {
        Add(u64, usize),
        Remove(u64, usize),
        Trim(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..100, 0usize..20).prop_map(|(s, n)| Op::Add(s, n)),
            (0u64..100, 1usize..20).prop_map(|(s, n)| Op::Remove(s, n)),
            (0u64..100).prop_map(Op::Trim),
        ]
    }

    fn apply(list: &mut BulkList, op: &Op) {
        match *op {
            Op::Add(start, count) => list.add(start, &blocks(start, count)),
            Op::Remove(start, count) => list.remove(start, count),
            Op::Trim(top) => list.trim(top),
        }
    }

    fn assert_invariants(list: &BulkList) {
        for pair in list.bulks.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].next_height() <= pair[1].start);
            // Two adjacent contiguous bulks must have been merged
            // unless one of them is a marker.
            if pair[0].next_height() == pair[1].start {
                assert!(pair[0].is_empty() || pair[1].is_empty());
            }
        }
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_op_sequence(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut list = BulkList::new();
            for op in &ops {
                apply(&mut list, op);
                assert_invariants(&list);
            }
        }

        #[test]
        fn add_is_idempotent(
            ops in prop::collection::vec(op_strategy(), 0..20),
            start in 0u64..100,
            count in 0usize..20,
        ) {
            let mut once = BulkList::new();
            for op in &ops {
                apply(&mut once, op);
            }
            let mut twice = BulkList::new();
            for op in &ops {
                apply(&mut twice, op);
            }

            once.add(start, &blocks(start, count));
            twice.add(start, &blocks(start, count));
            twice.add(start, &blocks(start, count));

            prop_assert_eq!(snapshot(&once), snapshot(&twice));
        }

        #[test]
        fn add_never_loses_existing_data(
            ops in prop::collection::vec(op_strategy(), 0..20),
            start in 0u64..100,
            count in 0usize..20,
        ) {
            let mut list = BulkList::new();
            for op in &ops {
                apply(&mut list, op);
            }

            let before: Vec<(u64, Vec<u64>)> = snapshot(&list);
            // New blocks are tagged so overlap survivors are visible.
            let incoming: Vec<Arc<WalletBlock>> = (0..count as u64)
                .map(|i| Arc::new(WalletBlock::skeleton([9; 32], start + i)))
                .collect();
            list.add(start, &incoming);

            for (bulk_start, timestamps) in before {
                for (i, timestamp) in timestamps.iter().enumerate() {
                    let height = bulk_start + i as u64;
                    let got = list.get(height, 1);
                    prop_assert_eq!(got.len(), 1);
                    prop_assert_eq!(got[0].timestamp, *timestamp);
                    prop_assert_eq!(got[0].hash, [0; 32]);
                }
            }
        }

        #[test]
        fn get_and_available_agree(
            ops in prop::collection::vec(op_strategy(), 0..20),
            start in 0u64..120,
            max in 0usize..30,
        ) {
            let mut list = BulkList::new();
            for op in &ops {
                apply(&mut list, op);
            }

            let available = list.available(start);
            prop_assert_eq!(list.get(start, usize::MAX).len(), available);
            if available > 0 {
                prop_assert_eq!(list.get(start, max).len(), available.min(max));
            } else {
                prop_assert_eq!(list.get(start, max).len(), 0);
            }

            // Whatever get returns is consecutive from `start`.
            for (i, block) in list.get(start, max).iter().enumerate() {
                prop_assert_eq!(block.timestamp, start + i as u64);
            }
        }
    }
}
