//! Greedy line packing for token widths
//!
//! Splits a sentence's token widths into contiguous ranges whose sums stay
//! strictly below the line budget. A token is never split; one that is wider
//! than the budget on its own gets a line to itself.

use std::ops::Range;

/// Partition `widths` into contiguous, non-empty ranges covering `0..widths.len()`.
pub fn chunk_ranges(widths: &[f32], budget: f32) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0usize;

    while start < widths.len() {
        let len = fitting_prefix_len(&widths[start..], budget).max(1);
        let end = start + len;
        debug_assert!(end > start && end <= widths.len());

        ranges.push(start..end);
        start = end;
    }

    ranges
}

/// Length of the longest prefix whose running sum is below `budget`.
fn fitting_prefix_len(widths: &[f32], budget: f32) -> usize {
    let mut sum = 0.0;
    for (i, &width) in widths.iter().enumerate() {
        sum += width;
        if sum >= budget {
            return i;
        }
    }
    widths.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_greedily_below_budget() {
        assert_eq!(chunk_ranges(&[10.0, 10.0, 10.0, 5.0], 25.0), vec![0..2, 2..4]);
    }

    #[test]
    fn oversized_token_gets_its_own_chunk() {
        assert_eq!(chunk_ranges(&[30.0], 25.0), vec![0..1]);
        assert_eq!(
            chunk_ranges(&[5.0, 30.0, 5.0], 25.0),
            vec![0..1, 1..2, 2..3]
        );
    }

    #[test]
    fn sum_equal_to_budget_does_not_fit() {
        assert_eq!(chunk_ranges(&[10.0, 15.0], 25.0), vec![0..1, 1..2]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_ranges(&[], 25.0).is_empty());
    }

    #[test]
    fn trailing_token_is_kept() {
        let ranges = chunk_ranges(&[20.0, 20.0, 20.0], 25.0);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn non_positive_budget_still_makes_progress() {
        assert_eq!(chunk_ranges(&[1.0, 2.0], 0.0), vec![0..1, 1..2]);
    }

    #[test]
    fn everything_fits_on_one_line() {
        assert_eq!(chunk_ranges(&[1.0, 2.0, 3.0], 2500.0), vec![0..3]);
    }
}
