use anyhow::{anyhow, bail};
use itertools::Itertools;
use std::fmt;

/// Kind of a CIGAR operation. Numeric codes follow the SAM/BAM interchange
/// format; code 3 (`N`, reference skip) has no variant and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Match,
    Insertion,
    Deletion,
    SoftClip,
    HardClip,
}

impl OpKind {
    pub fn code(self) -> u8 {
        match self {
            OpKind::Match => 0,
            OpKind::Insertion => 1,
            OpKind::Deletion => 2,
            OpKind::SoftClip => 4,
            OpKind::HardClip => 5,
        }
    }

    pub fn from_code(code: u8) -> anyhow::Result<Self> {
        match code {
            0 => Ok(OpKind::Match),
            1 => Ok(OpKind::Insertion),
            2 => Ok(OpKind::Deletion),
            3 => Err(anyhow!("reference skip (code 3) is not supported")),
            4 => Ok(OpKind::SoftClip),
            5 => Ok(OpKind::HardClip),
            _ => Err(anyhow!("Invalid CIGAR operation code: {}", code)),
        }
    }

    pub fn letter(self) -> char {
        match self {
            OpKind::Match => 'M',
            OpKind::Insertion => 'I',
            OpKind::Deletion => 'D',
            OpKind::SoftClip => 'S',
            OpKind::HardClip => 'H',
        }
    }

    pub fn from_letter(c: char) -> anyhow::Result<Self> {
        match c {
            'M' => Ok(OpKind::Match),
            'I' => Ok(OpKind::Insertion),
            'D' => Ok(OpKind::Deletion),
            'S' => Ok(OpKind::SoftClip),
            'H' => Ok(OpKind::HardClip),
            'N' => Err(anyhow!("reference skip (N) is not supported")),
            _ => Err(anyhow!("Invalid CIGAR operation: {}", c)),
        }
    }

    pub fn consumes_reference(self) -> bool {
        matches!(self, OpKind::Match | OpKind::Deletion)
    }

    /// Match, insertion and soft clip. Hard-clipped bases are not stored.
    pub fn consumes_query(self) -> bool {
        matches!(self, OpKind::Match | OpKind::Insertion | OpKind::SoftClip)
    }

    /// Match and insertion: the query bases that take part in the alignment.
    pub fn is_aligned_query(self) -> bool {
        matches!(self, OpKind::Match | OpKind::Insertion)
    }

    pub fn is_clip(self) -> bool {
        matches!(self, OpKind::SoftClip | OpKind::HardClip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub kind: OpKind,
    pub len: u64,
}

impl Operation {
    pub const fn new(kind: OpKind, len: u64) -> Self {
        Operation { kind, len }
    }

    pub const fn matched(len: u64) -> Self {
        Operation::new(OpKind::Match, len)
    }

    pub const fn insertion(len: u64) -> Self {
        Operation::new(OpKind::Insertion, len)
    }

    pub const fn deletion(len: u64) -> Self {
        Operation::new(OpKind::Deletion, len)
    }

    pub const fn soft_clip(len: u64) -> Self {
        Operation::new(OpKind::SoftClip, len)
    }

    pub const fn hard_clip(len: u64) -> Self {
        Operation::new(OpKind::HardClip, len)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.letter())
    }
}

fn sum_where(ops: &[Operation], pred: impl Fn(OpKind) -> bool) -> u64 {
    ops.iter().filter(|op| pred(op.kind)).map(|op| op.len).sum()
}

/// Sum of Match and Deletion lengths.
pub fn reference_span(ops: &[Operation]) -> u64 {
    sum_where(ops, OpKind::consumes_reference)
}

/// Sum of Match and Insertion lengths.
pub fn aligned_query_len(ops: &[Operation]) -> u64 {
    sum_where(ops, OpKind::is_aligned_query)
}

/// Sum of Match, Insertion and SoftClip lengths, i.e. the stored query length.
pub fn accounted_query_len(ops: &[Operation]) -> u64 {
    sum_where(ops, OpKind::consumes_query)
}

/// Parses SAM CIGAR text. `*` is an empty operation list.
///
/// ```
/// use samstitch::libs::cigar::{parse_cigar, Operation};
/// let ops = parse_cigar("5S40M5S").unwrap();
/// assert_eq!(ops, vec![Operation::soft_clip(5), Operation::matched(40), Operation::soft_clip(5)]);
/// ```
pub fn parse_cigar(s: &str) -> anyhow::Result<Vec<Operation>> {
    if s == "*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<u64> = None;
    for c in s.chars() {
        if let Some(d) = c.to_digit(10) {
            let cur = len.unwrap_or(0);
            len = Some(
                cur.checked_mul(10)
                    .and_then(|v| v.checked_add(d as u64))
                    .ok_or_else(|| anyhow!("CIGAR length overflows: {}", s))?,
            );
        } else {
            let kind = OpKind::from_letter(c)?;
            match len.take() {
                Some(0) => bail!("Zero-length operation in CIGAR: {}", s),
                Some(l) => ops.push(Operation::new(kind, l)),
                None => bail!("Operation without length in CIGAR: {}", s),
            }
        }
    }
    if len.is_some() {
        bail!("Trailing length without operation in CIGAR: {}", s);
    }

    Ok(ops)
}

pub fn format_cigar(ops: &[Operation]) -> String {
    if ops.is_empty() {
        return "*".to_string();
    }
    ops.iter().join("")
}
