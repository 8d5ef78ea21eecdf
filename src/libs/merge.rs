use crate::libs::cigar::{OpKind, Operation};
use crate::libs::error::StitchError;
use crate::libs::record::{AlignmentRecord, ChainOffset};
use crate::libs::select::select_chain_indices;

/// Stitches an ordered chain into one record covering the whole query.
///
/// Reference gaps between members become deletions. Query gaps become an
/// insertion, or a soft clip before the first member; the unaligned rest of
/// the query after the last member is soft clipped. Member clips are dropped.
///
/// The query is tracked as a [`ChainOffset`], so one comparison works for
/// both strands. The result is checked against every record invariant and an
/// [`StitchError::InvariantViolation`] is returned instead of a corrected record.
///
/// Members that cannot be stitched are reported by kind:
///
/// * [`StitchError::MixedStrandChain`]: a member on the other strand.
/// * [`StitchError::OutOfOrderMember`]: a member starting on the reference
///   before the previous member starts.
/// * [`StitchError::OverlappingChainMembers`]: any other member starting
///   before the reference or query position the chain already reached,
///   i.e. one that overlaps the previous member.
/// * [`StitchError::UnsupportedInteriorClip`]: a clip between aligned
///   operations, or nothing aligned.
pub fn merge(
    chain: &[AlignmentRecord],
    reference_length: u64,
    query_length: u64,
) -> Result<AlignmentRecord, StitchError> {
    let first = chain.first().ok_or(StitchError::EmptyCandidateSet)?;
    let strand = first.strand();

    let mut ops: Vec<Operation> = Vec::new();
    let mut p_pos = first.reference_start();
    let mut p_qpos = ChainOffset::read_start(strand, query_length);
    let mut previous_start = first.reference_start();

    for (index, member) in chain.iter().enumerate() {
        if member.strand() != strand {
            return Err(StitchError::MixedStrandChain {
                index,
                expected: strand,
                found: member.strand(),
            });
        }
        if member.reference_start() < previous_start {
            return Err(StitchError::OutOfOrderMember {
                index,
                reference_start: member.reference_start(),
                previous_start,
            });
        }

        let q_offset = member.first_aligned_offset(query_length);
        if member.reference_start() < p_pos || q_offset < p_qpos {
            return Err(StitchError::OverlappingChainMembers {
                index,
                reference_start: member.reference_start(),
                reference_reached: p_pos,
                query_offset: q_offset.value(),
                query_reached: p_qpos.value(),
            });
        }

        let interior = member
            .aligned_interior()
            .ok_or(StitchError::UnsupportedInteriorClip { index })?;

        if member.reference_start() > p_pos {
            ops.push(Operation::deletion(member.reference_start() - p_pos));
            p_pos = member.reference_start();
        }

        if q_offset > p_qpos {
            let kind = if index == 0 {
                OpKind::SoftClip
            } else {
                OpKind::Insertion
            };
            ops.push(Operation::new(kind, p_qpos.distance_to(q_offset)));
            p_qpos = q_offset;
        }

        for op in interior {
            ops.push(*op);
            if op.kind.consumes_reference() {
                p_pos += op.len;
            }
            if op.kind.is_aligned_query() {
                p_qpos = p_qpos.advance(op.len);
            }
        }

        previous_start = member.reference_start();
    }

    let read_end = ChainOffset::read_end(strand, query_length);
    if p_qpos < read_end {
        ops.push(Operation::soft_clip(p_qpos.distance_to(read_end)));
    }

    let merged = AlignmentRecord::new(
        first.query_name(),
        first.reference_name(),
        first.reference_start(),
        strand,
        ops,
    )?;
    merged.validate(reference_length, query_length)?;

    Ok(merged)
}

/// Selects the best chain of one candidate group and merges it.
pub fn chain_and_merge<F>(
    candidates: &[AlignmentRecord],
    reference_length: u64,
    query_length: u64,
    max_gap: u64,
    score: F,
) -> Result<AlignmentRecord, StitchError>
where
    F: Fn(&AlignmentRecord) -> f64,
{
    let indices = select_chain_indices(candidates, query_length, max_gap, score)?;
    let chain: Vec<AlignmentRecord> = indices.into_iter().map(|i| candidates[i].clone()).collect();
    merge(&chain, reference_length, query_length)
}
