use crate::libs::cigar::{self, OpKind, Operation};
use crate::libs::error::StitchError;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    pub fn is_reverse(self) -> bool {
        self == Strand::Reverse
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// A query coordinate in chain order.
///
/// Chaining needs query positions that grow with reference positions on both
/// strands. On the forward strand the offset is the stored query position.
/// On the reverse strand the stored query is the reverse complement of the
/// read, and the offset is `stored - (query_length - 1)`: the read then runs
/// from `-(query_length - 1)` to `0`, and one past its last base is `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainOffset(i64);

impl ChainOffset {
    pub fn from_query_pos(pos: i64, strand: Strand, query_length: u64) -> Self {
        match strand {
            Strand::Forward => ChainOffset(pos),
            Strand::Reverse => ChainOffset(pos - (query_length as i64 - 1)),
        }
    }

    /// Offset of the first base of the read.
    pub fn read_start(strand: Strand, query_length: u64) -> Self {
        Self::from_query_pos(0, strand, query_length)
    }

    /// Offset one past the last base of the read.
    pub fn read_end(strand: Strand, query_length: u64) -> Self {
        Self::from_query_pos(query_length as i64, strand, query_length)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn advance(self, len: u64) -> Self {
        ChainOffset(self.0 + len as i64)
    }

    /// Number of positions from `self` up to `later`; zero if `later` is not ahead.
    pub fn distance_to(self, later: ChainOffset) -> u64 {
        (later.0 - self.0).max(0) as u64
    }
}

/// One linear alignment of a query against a reference.
///
/// Records are immutable: the reference end and the query bounds are derived
/// from the operation list on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    query_name: String,
    reference_name: String,
    reference_start: u64,
    strand: Strand,
    ops: Vec<Operation>,
}

impl AlignmentRecord {
    pub fn new(
        query_name: &str,
        reference_name: &str,
        reference_start: u64,
        strand: Strand,
        ops: Vec<Operation>,
    ) -> Result<Self, StitchError> {
        if let Some((index, op)) = ops.iter().enumerate().find(|(_, op)| op.len == 0) {
            return Err(StitchError::ZeroLengthOperation { index, op: *op });
        }

        Ok(AlignmentRecord {
            query_name: query_name.to_string(),
            reference_name: reference_name.to_string(),
            reference_start,
            strand,
            ops,
        })
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    pub fn reference_start(&self) -> u64 {
        self.reference_start
    }

    /// Exclusive.
    pub fn reference_end(&self) -> u64 {
        self.reference_start + cigar::reference_span(&self.ops)
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Length of the leading soft clip, past any outer hard clip.
    pub fn query_start(&self) -> u64 {
        self.ops
            .iter()
            .skip_while(|op| op.kind == OpKind::HardClip)
            .take_while(|op| op.kind == OpKind::SoftClip)
            .map(|op| op.len)
            .sum()
    }

    pub fn query_end(&self) -> u64 {
        self.query_start() + cigar::aligned_query_len(&self.ops)
    }

    /// Leading soft and hard clips together.
    pub fn leading_clip(&self) -> u64 {
        self.ops
            .iter()
            .take_while(|op| op.kind.is_clip())
            .map(|op| op.len)
            .sum()
    }

    pub fn trailing_clip(&self) -> u64 {
        self.ops
            .iter()
            .rev()
            .take_while(|op| op.kind.is_clip())
            .map(|op| op.len)
            .sum()
    }

    /// Chain offset of the first aligned query base.
    pub fn first_aligned_offset(&self, query_length: u64) -> ChainOffset {
        ChainOffset::from_query_pos(self.leading_clip() as i64, self.strand, query_length)
    }

    /// Chain offset of the last aligned query base.
    pub fn last_aligned_offset(&self, query_length: u64) -> ChainOffset {
        let pos = query_length as i64 - 1 - self.trailing_clip() as i64;
        ChainOffset::from_query_pos(pos, self.strand, query_length)
    }

    /// The operations between the leading and the trailing clips.
    ///
    /// `None` when a clip sits between aligned operations or nothing is aligned.
    pub fn aligned_interior(&self) -> Option<&[Operation]> {
        let lead = self.ops.iter().take_while(|op| op.kind.is_clip()).count();
        let trail = self.ops[lead..]
            .iter()
            .rev()
            .take_while(|op| op.kind.is_clip())
            .count();
        let interior = &self.ops[lead..self.ops.len() - trail];

        if interior.is_empty() || interior.iter().any(|op| op.kind.is_clip()) {
            None
        } else {
            Some(interior)
        }
    }

    /// Number of reference positions covered by Match operations.
    pub fn matched_bases(&self) -> u64 {
        self.ops
            .iter()
            .filter(|op| op.kind == OpKind::Match)
            .map(|op| op.len)
            .sum()
    }

    /// Checks the record invariants against the full reference and query lengths.
    ///
    /// Invariant 1, the reference span matching `reference_end - reference_start`,
    /// holds for every record since the end is derived from the operations;
    /// checks start at invariant 2.
    pub fn validate(&self, reference_length: u64, query_length: u64) -> Result<(), StitchError> {
        let accounted = cigar::accounted_query_len(&self.ops);
        if accounted != query_length {
            return Err(StitchError::invariant(
                2,
                format!(
                    "operations account for {} query bases, query has {}",
                    accounted, query_length
                ),
            ));
        }

        if let Some(op) = self.ops.iter().find(|op| op.kind == OpKind::HardClip) {
            return Err(StitchError::invariant(3, format!("hard clip {} present", op)));
        }

        if self.reference_start >= reference_length || self.reference_end() > reference_length {
            return Err(StitchError::invariant(
                4,
                format!(
                    "reference {}-{} outside length {}",
                    self.reference_start,
                    self.reference_end(),
                    reference_length
                ),
            ));
        }

        let aligned = cigar::aligned_query_len(&self.ops);
        if self.query_start() >= query_length
            || self.query_end() > query_length
            || self.query_start() + aligned != self.query_end()
        {
            return Err(StitchError::invariant(
                5,
                format!(
                    "query {}-{} outside length {}",
                    self.query_start(),
                    self.query_end(),
                    query_length
                ),
            ));
        }

        let last = self.ops.len().saturating_sub(1);
        if let Some(index) = self
            .ops
            .iter()
            .enumerate()
            .position(|(i, op)| op.kind == OpKind::SoftClip && i != 0 && i != last)
        {
            return Err(StitchError::invariant(
                6,
                format!(
                    "soft clip at operation {} of {}",
                    index,
                    cigar::format_cigar(&self.ops)
                ),
            ));
        }

        Ok(())
    }
}

/// Default chain score: the number of Match positions.
pub fn matched_bases(record: &AlignmentRecord) -> f64 {
    record.matched_bases() as f64
}

/// Groups records by `(query_name, reference_name)`, keeping first-seen order.
pub fn group_candidates<I>(records: I) -> IndexMap<(String, String), Vec<AlignmentRecord>>
where
    I: IntoIterator<Item = AlignmentRecord>,
{
    let mut groups: IndexMap<(String, String), Vec<AlignmentRecord>> = IndexMap::new();
    for record in records {
        let key = (
            record.query_name().to_string(),
            record.reference_name().to_string(),
        );
        groups.entry(key).or_default().push(record);
    }
    groups
}

/// Output order: ascending by `(reference_start, reference_end)`.
pub fn sort_for_output(records: &mut [AlignmentRecord]) {
    records.sort_by_key(|r| (r.reference_start(), r.reference_end()));
}
