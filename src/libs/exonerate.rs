use crate::libs::cigar::{OpKind, Operation};
use crate::libs::record::{AlignmentRecord, Strand};
use anyhow::{anyhow, bail};
use std::fmt;

/// A pairwise alignment in exonerate `cigar:` line form, the format used to
/// hand alignments to the external realigner and to read its output back.
///
/// ```text
/// cigar: chr1 100 140 + read1 5 45 + 0 M 20 I 1 M 9 D 1 M 10
/// ```
///
/// The first sequence is the reference and the second the query. `I` consumes
/// only the query, `D` only the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignment {
    pub contig1: String,
    pub start1: u64,
    pub end1: u64,
    pub strand1: Strand,
    pub contig2: String,
    pub start2: u64,
    pub end2: u64,
    pub strand2: Strand,
    pub score: f64,
    pub ops: Vec<Operation>,
}

impl PairwiseAlignment {
    /// The aligned interior of a record, with stored query coordinates.
    pub fn from_record(record: &AlignmentRecord) -> anyhow::Result<Self> {
        let ops = record
            .aligned_interior()
            .ok_or_else(|| anyhow!("{} has no alignable interior", record.query_name()))?;

        Ok(PairwiseAlignment {
            contig1: record.reference_name().to_string(),
            start1: record.reference_start(),
            end1: record.reference_end(),
            strand1: Strand::Forward,
            contig2: record.query_name().to_string(),
            start2: record.query_start(),
            end2: record.query_end(),
            strand2: Strand::Forward,
            score: record.matched_bases() as f64,
            ops: ops.to_vec(),
        })
    }
}

fn parse_strand(s: &str) -> anyhow::Result<Strand> {
    match s {
        "+" => Ok(Strand::Forward),
        "-" => Ok(Strand::Reverse),
        _ => Err(anyhow!("Invalid strand: {}", s)),
    }
}

impl std::str::FromStr for PairwiseAlignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.first() != Some(&"cigar:") {
            bail!("Not a cigar line: {}", s);
        }
        if fields.len() < 10 {
            bail!("Invalid cigar line: fewer than 10 fields");
        }

        let parse_u64 = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| anyhow!("Invalid coordinate: {}", v))
        };

        let mut ops = Vec::new();
        for pair in fields[10..].chunks(2) {
            let [kind, len] = pair else {
                bail!("Operation without length in cigar line");
            };
            let kind = match *kind {
                "M" => OpKind::Match,
                "I" => OpKind::Insertion,
                "D" => OpKind::Deletion,
                _ => bail!("Invalid cigar line operation: {}", kind),
            };
            let len = parse_u64(*len)?;
            if len == 0 {
                bail!("Zero-length operation in cigar line");
            }
            ops.push(Operation::new(kind, len));
        }

        Ok(PairwiseAlignment {
            contig1: fields[1].to_string(),
            start1: parse_u64(fields[2])?,
            end1: parse_u64(fields[3])?,
            strand1: parse_strand(fields[4])?,
            contig2: fields[5].to_string(),
            start2: parse_u64(fields[6])?,
            end2: parse_u64(fields[7])?,
            strand2: parse_strand(fields[8])?,
            score: fields[9]
                .parse()
                .map_err(|_| anyhow!("Invalid score: {}", fields[9]))?,
            ops,
        })
    }
}

impl fmt::Display for PairwiseAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cigar: {} {} {} {} {} {} {} {} {}",
            self.contig1,
            self.start1,
            self.end1,
            self.strand1,
            self.contig2,
            self.start2,
            self.end2,
            self.strand2,
            self.score
        )?;
        for op in &self.ops {
            write!(f, " {} {}", op.kind.letter(), op.len)?;
        }
        Ok(())
    }
}
