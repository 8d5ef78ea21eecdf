use crate::libs::error::StitchError;
use crate::libs::record::{AlignmentRecord, ChainOffset, Strand};

/// Start and last-base coordinates of a candidate in both sequences.
/// Query coordinates are chain offsets, so they grow with the reference on
/// either strand.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    ref_start: i64,
    query_start: ChainOffset,
    ref_last: i64,
    query_last: ChainOffset,
    strand: Strand,
}

impl Bounds {
    fn of(record: &AlignmentRecord, query_length: u64) -> Self {
        Bounds {
            ref_start: record.reference_start() as i64,
            query_start: record.first_aligned_offset(query_length),
            ref_last: record.reference_end() as i64 - 1,
            query_last: record.last_aligned_offset(query_length),
            strand: record.strand(),
        }
    }

    /// Whether `self` may directly follow `prev` in a chain.
    fn follows(&self, prev: &Bounds, max_gap: i64) -> bool {
        self.ref_start > prev.ref_last
            && self.query_start > prev.query_last
            && self.strand == prev.strand
            && (self.ref_start - prev.ref_last)
                + (self.query_start.value() - prev.query_last.value())
                <= max_gap
    }
}

/// Finds the highest-scoring chain and returns indices into `candidates`,
/// in ascending reference order.
///
/// Candidates are sorted by reference start (stable, so equal starts keep
/// input order). A candidate accumulates the best chain score ending at it;
/// a predecessor must end strictly before it in both sequences, lie on the
/// same strand, and leave a combined gap of at most `max_gap`. An equal
/// improvement never replaces the first predecessor found, and among chain
/// ends with equal scores the last one in sorted order wins.
pub fn select_chain_indices<F>(
    candidates: &[AlignmentRecord],
    query_length: u64,
    max_gap: u64,
    score: F,
) -> Result<Vec<usize>, StitchError>
where
    F: Fn(&AlignmentRecord) -> f64,
{
    if candidates.is_empty() {
        return Err(StitchError::EmptyCandidateSet);
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by_key(|&i| candidates[i].reference_start());

    let bounds: Vec<Bounds> = order
        .iter()
        .map(|&i| Bounds::of(&candidates[i], query_length))
        .collect();
    let scores: Vec<f64> = order.iter().map(|&i| score(&candidates[i])).collect();

    let max_gap = i64::try_from(max_gap).unwrap_or(i64::MAX);
    let mut totals = scores.clone();
    let mut preds: Vec<Option<usize>> = vec![None; order.len()];

    for i in 0..order.len() {
        for j in 0..i {
            if bounds[i].follows(&bounds[j], max_gap) && totals[j] + scores[i] > totals[i] {
                totals[i] = totals[j] + scores[i];
                preds[i] = Some(j);
            }
        }
    }

    let mut best = 0;
    for i in 1..order.len() {
        if totals[i] >= totals[best] {
            best = i;
        }
    }

    let mut chain = vec![best];
    let mut cur = best;
    while let Some(prev) = preds[cur] {
        chain.push(prev);
        cur = prev;
    }
    chain.reverse();

    log::debug!(
        "{}: chained {} of {} candidates, score {}",
        candidates[order[best]].query_name(),
        chain.len(),
        candidates.len(),
        totals[best]
    );

    Ok(chain.into_iter().map(|k| order[k]).collect())
}

/// Like [`select_chain_indices`], returning the chained records themselves.
pub fn select_chain<F>(
    candidates: &[AlignmentRecord],
    query_length: u64,
    max_gap: u64,
    score: F,
) -> Result<Vec<AlignmentRecord>, StitchError>
where
    F: Fn(&AlignmentRecord) -> f64,
{
    let indices = select_chain_indices(candidates, query_length, max_gap, score)?;
    Ok(indices.into_iter().map(|i| candidates[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::cigar::parse_cigar;
    use crate::libs::record::matched_bases;

    fn fwd(start: u64, cigar: &str) -> AlignmentRecord {
        AlignmentRecord::new("read", "chr1", start, Strand::Forward, parse_cigar(cigar).unwrap())
            .unwrap()
    }

    fn rev(start: u64, cigar: &str) -> AlignmentRecord {
        AlignmentRecord::new("read", "chr1", start, Strand::Reverse, parse_cigar(cigar).unwrap())
            .unwrap()
    }

    fn assert_disjoint(chain: &[AlignmentRecord], query_length: u64) {
        for pair in chain.windows(2) {
            assert!(pair[1].reference_start() >= pair[0].reference_end());
            assert!(
                pair[1].first_aligned_offset(query_length)
                    > pair[0].last_aligned_offset(query_length)
            );
        }
    }

    #[test]
    fn test_empty() {
        let err = select_chain(&[], 50, 200, matched_bases).unwrap_err();
        assert_eq!(err, StitchError::EmptyCandidateSet);
    }

    #[test]
    fn test_single() {
        let only = fwd(10, "50M");
        let chain = select_chain(&[only.clone()], 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![only]);
    }

    #[test]
    fn test_two_fragments() {
        // given out of order
        let candidates = vec![fwd(130, "25S15M10S"), fwd(100, "20M30S")];
        let chain = select_chain_indices(&candidates, 50, 20, matched_bases).unwrap();
        assert_eq!(chain, vec![1, 0]);
    }

    #[test]
    fn test_gap_too_large() {
        // gap = (200 - 119) + (25 - 19) = 87
        let candidates = vec![fwd(100, "20M30S"), fwd(200, "25S15M10S")];
        let chain = select_chain(&candidates, 50, 20, matched_bases).unwrap();
        assert_eq!(chain, vec![candidates[0].clone()]);

        let chain = select_chain(&candidates, 50, 87, matched_bases).unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_overlapping_not_chained() {
        // reference overlap
        let candidates = vec![fwd(100, "30M20S"), fwd(120, "30S20M")];
        let chain = select_chain(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![candidates[0].clone()]);

        // query overlap
        let candidates = vec![fwd(100, "30M20S"), fwd(140, "25S20M5S")];
        let chain = select_chain(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![candidates[0].clone()]);

        // same reference start never chains
        let candidates = vec![fwd(100, "10M40S"), fwd(100, "20S10M20S")];
        let chain = select_chain(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_strands_not_mixed() {
        let candidates = vec![fwd(100, "20M30S"), rev(130, "25S15M10S")];
        let chain = select_chain(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![candidates[0].clone()]);
    }

    #[test]
    fn test_reverse_strand_chain() {
        // stored query is reverse complemented; offsets run -49..=0
        let candidates = vec![rev(300, "30S20M"), rev(250, "10S15M25S")];
        let chain = select_chain_indices(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![1, 0]);
    }

    #[test]
    fn test_best_chain_beats_bigger_singleton() {
        let candidates = vec![
            fwd(100, "20M80S"),
            fwd(125, "25S20M55S"),
            fwd(150, "50S20M30S"),
            fwd(5000, "45M55S"),
        ];
        let chain = select_chain_indices(&candidates, 100, 50, matched_bases).unwrap();
        assert_eq!(chain, vec![0, 1, 2]);
        let records: Vec<_> = chain.iter().map(|&i| candidates[i].clone()).collect();
        assert_disjoint(&records, 100);
    }

    #[test]
    fn test_custom_score() {
        let candidates = vec![fwd(100, "20M30S"), fwd(130, "25S15M10S"), fwd(5000, "50M")];
        // default prefers the lone 50M
        let chain = select_chain_indices(&candidates, 50, 20, matched_bases).unwrap();
        assert_eq!(chain, vec![2]);
        // a flat score prefers the longer chain
        let chain = select_chain_indices(&candidates, 50, 20, |_| 1.0).unwrap();
        assert_eq!(chain, vec![0, 1]);
    }

    #[test]
    fn test_tie_last_end_wins() {
        // equal singletons that cannot chain: the last in reference order wins
        let candidates = vec![fwd(500, "10S20M20S"), fwd(100, "10S20M20S")];
        let chain = select_chain_indices(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![0]);

        // equal reference starts keep input order, so the later input wins
        let candidates = vec![fwd(100, "20M30S"), fwd(100, "20S20M10S")];
        let chain = select_chain_indices(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![1]);
    }

    #[test]
    fn test_tie_first_predecessor_wins() {
        // two equally scored predecessors for the last fragment
        let candidates = vec![
            fwd(100, "10M40S"),
            fwd(105, "10S10M30S"),
            fwd(130, "30S10M10S"),
        ];
        let chain = select_chain_indices(&candidates, 50, 200, matched_bases).unwrap();
        assert_eq!(chain, vec![0, 2]);
    }
}
