use crate::libs::cigar::Operation;
use crate::libs::record::Strand;

/// Failures of the chaining, merging and splicing core.
///
/// All kinds are local validation failures raised before any result is
/// produced. Only [`StitchError::InvariantViolation`] points at a bug in the
/// merger itself; the rest describe bad input for one read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StitchError {
    #[error("candidate set is empty")]
    EmptyCandidateSet,

    #[error(
        "chain member {index} starts at reference {reference_start}, query offset {query_offset}, \
         but the chain already reached reference {reference_reached}, query offset {query_reached}"
    )]
    OverlappingChainMembers {
        index: usize,
        reference_start: u64,
        reference_reached: u64,
        query_offset: i64,
        query_reached: i64,
    },

    #[error("chain member {index} starts at {reference_start}, before the previous member at {previous_start}")]
    OutOfOrderMember {
        index: usize,
        reference_start: u64,
        previous_start: u64,
    },

    #[error("chain member {index} has a clip inside its operations or nothing aligned")]
    UnsupportedInteriorClip { index: usize },

    #[error("invariant {invariant} violated: {detail}")]
    InvariantViolation { invariant: u8, detail: String },

    #[error(
        "replacement covers {query} query and {reference} reference bases, \
         the record aligned {expected_query} and {expected_reference}"
    )]
    ReplacementLengthMismatch {
        query: u64,
        reference: u64,
        expected_query: u64,
        expected_reference: u64,
    },

    #[error("replacement contains clip operation {op}")]
    UnexpectedClipInReplacement { op: Operation },

    #[error("spliced record accounts for {spliced} query bases, the original for {original}")]
    ClipPreservationViolation { original: u64, spliced: u64 },

    #[error("chain member {index} is on strand {found}, the chain is on {expected}")]
    MixedStrandChain {
        index: usize,
        expected: Strand,
        found: Strand,
    },

    #[error("operation {index} ({op}) has zero length")]
    ZeroLengthOperation { index: usize, op: Operation },
}

impl StitchError {
    /// True when the error signals a logic bug rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StitchError::InvariantViolation { .. })
    }

    pub(crate) fn invariant(invariant: u8, detail: impl Into<String>) -> Self {
        StitchError::InvariantViolation {
            invariant,
            detail: detail.into(),
        }
    }
}
