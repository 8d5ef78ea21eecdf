use crate::libs::cigar::{format_cigar, parse_cigar};
use crate::libs::record::{AlignmentRecord, Strand};
use anyhow::{anyhow, Context};
use std::fmt;
use std::io::{self, BufRead};

pub const FLAG_UNMAPPED: u16 = 0x4;
pub const FLAG_REVERSE: u16 = 0x10;

/// One alignment line of a SAM text file.
///
/// `pos` is 1-based as in the file; `0` means no position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamRecord {
    pub qname: String,
    pub flag: u16,
    pub rname: String,
    pub pos: u64,
    pub mapq: u8,
    pub cigar: String,
    pub rnext: String,
    pub pnext: u64,
    pub tlen: i64,
    pub seq: String,
    pub qual: String,
    pub tags: Vec<String>,
}

impl Default for SamRecord {
    fn default() -> Self {
        SamRecord {
            qname: "*".to_string(),
            flag: FLAG_UNMAPPED,
            rname: "*".to_string(),
            pos: 0,
            mapq: 255,
            cigar: "*".to_string(),
            rnext: "*".to_string(),
            pnext: 0,
            tlen: 0,
            seq: "*".to_string(),
            qual: "*".to_string(),
            tags: Vec::new(),
        }
    }
}

impl SamRecord {
    pub fn is_unmapped(&self) -> bool {
        self.flag & FLAG_UNMAPPED != 0 || self.cigar == "*" || self.rname == "*" || self.pos == 0
    }

    pub fn strand(&self) -> Strand {
        if self.flag & FLAG_REVERSE != 0 {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// Length of the stored sequence, if present.
    pub fn seq_len(&self) -> Option<u64> {
        if self.seq == "*" {
            None
        } else {
            Some(self.seq.len() as u64)
        }
    }

    pub fn to_alignment(&self) -> anyhow::Result<AlignmentRecord> {
        if self.is_unmapped() {
            return Err(anyhow!("{} is unmapped", self.qname));
        }
        let ops = parse_cigar(&self.cigar).with_context(|| format!("record {}", self.qname))?;
        let record = AlignmentRecord::new(&self.qname, &self.rname, self.pos - 1, self.strand(), ops)
            .with_context(|| format!("record {}", self.qname))?;
        Ok(record)
    }

    /// A primary record for a stitched alignment. `read` is the original read;
    /// it is stored reverse complemented on the reverse strand.
    pub fn from_alignment(record: &AlignmentRecord, read: &[u8]) -> Self {
        let seq = if record.strand().is_reverse() {
            crate::libs::seq::rev_comp(read)
        } else {
            read.to_vec()
        };

        SamRecord {
            qname: record.query_name().to_string(),
            flag: if record.strand().is_reverse() {
                FLAG_REVERSE
            } else {
                0
            },
            rname: record.reference_name().to_string(),
            pos: record.reference_start() + 1,
            cigar: format_cigar(record.ops()),
            seq: String::from_utf8_lossy(&seq).into_owned(),
            ..Default::default()
        }
    }

    /// This record with the position and operations of `record`; all other
    /// fields are kept.
    pub fn with_alignment(&self, record: &AlignmentRecord) -> Self {
        SamRecord {
            pos: record.reference_start() + 1,
            cigar: format_cigar(record.ops()),
            ..self.clone()
        }
    }

    pub fn write_to<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.qname,
            self.flag,
            self.rname,
            self.pos,
            self.mapq,
            self.cigar,
            self.rnext,
            self.pnext,
            self.tlen,
            self.seq,
            self.qual
        )?;
        for tag in &self.tags {
            write!(w, "\t{}", tag)?;
        }
        writeln!(w)?;
        Ok(())
    }
}

impl std::str::FromStr for SamRecord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('\t').collect();
        if fields.len() < 11 {
            return Err(anyhow!("Invalid SAM line: fewer than 11 columns"));
        }

        let parse = |name: &str, v: &str| anyhow!("Invalid {}: {}", name, v);

        Ok(SamRecord {
            qname: fields[0].to_string(),
            flag: fields[1].parse().map_err(|_| parse("FLAG", fields[1]))?,
            rname: fields[2].to_string(),
            pos: fields[3].parse().map_err(|_| parse("POS", fields[3]))?,
            mapq: fields[4].parse().map_err(|_| parse("MAPQ", fields[4]))?,
            cigar: fields[5].to_string(),
            rnext: fields[6].to_string(),
            pnext: fields[7].parse().map_err(|_| parse("PNEXT", fields[7]))?,
            tlen: fields[8].parse().map_err(|_| parse("TLEN", fields[8]))?,
            seq: fields[9].to_string(),
            qual: fields[10].to_string(),
            tags: fields[11..].iter().map(|t| t.to_string()).collect(),
        })
    }
}

impl fmt::Display for SamRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        let s = String::from_utf8_lossy(&buf);
        write!(f, "{}", s.trim_end())
    }
}

/// Reads a SAM text stream into its header lines and records.
pub fn read_sam<R: BufRead>(reader: R) -> anyhow::Result<(Vec<String>, Vec<SamRecord>)> {
    let mut header = Vec::new();
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('@') {
            header.push(line);
            continue;
        }
        let record: SamRecord = line
            .parse()
            .with_context(|| format!("SAM line {}", i + 1))?;
        records.push(record);
    }

    Ok((header, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LINE: &str = "read1\t16\tchr1\t101\t60\t5S40M5S\t*\t0\t0\tACGT\t*\tNM:i:0\tAS:i:40";

    #[test]
    fn test_parse_and_display() {
        let sam: SamRecord = LINE.parse().unwrap();
        assert_eq!(sam.qname, "read1");
        assert_eq!(sam.pos, 101);
        assert_eq!(sam.strand(), Strand::Reverse);
        assert_eq!(sam.tags, vec!["NM:i:0", "AS:i:40"]);
        assert!(!sam.is_unmapped());
        assert_eq!(sam.seq_len(), Some(4));
        assert_eq!(format!("{}", sam), LINE);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("read1\t0\tchr1".parse::<SamRecord>().is_err());
        let bad = LINE.replace("\t101\t", "\tx\t");
        assert!(bad.parse::<SamRecord>().is_err());
    }

    #[test]
    fn test_to_alignment() {
        let sam: SamRecord = LINE.parse().unwrap();
        let record = sam.to_alignment().unwrap();
        assert_eq!(record.reference_start(), 100);
        assert_eq!(record.reference_end(), 140);
        assert_eq!(record.strand(), Strand::Reverse);
        assert_eq!(record.query_name(), "read1");
        assert_eq!(record.reference_name(), "chr1");

        let unmapped: SamRecord = "read2\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\t*".parse().unwrap();
        assert!(unmapped.is_unmapped());
        assert!(unmapped.to_alignment().is_err());
    }

    #[test]
    fn test_from_and_with_alignment() {
        let sam: SamRecord = LINE.parse().unwrap();
        let record = sam.to_alignment().unwrap();

        let out = SamRecord::from_alignment(&record, b"AACG");
        assert_eq!(
            out.to_string(),
            "read1\t16\tchr1\t101\t255\t5S40M5S\t*\t0\t0\tCGTT\t*"
        );

        let shifted = crate::libs::record::AlignmentRecord::new(
            "read1",
            "chr1",
            120,
            Strand::Reverse,
            parse_cigar("50M").unwrap(),
        )
        .unwrap();
        let out = sam.with_alignment(&shifted);
        assert_eq!(out.pos, 121);
        assert_eq!(out.cigar, "50M");
        assert_eq!(out.mapq, 60);
        assert_eq!(out.tags, sam.tags);
    }

    #[test]
    fn test_read_sam() {
        let text = format!("@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:200\n\n{}\n", LINE);
        let (header, records) = read_sam(Cursor::new(text)).unwrap();
        assert_eq!(header.len(), 2);
        assert_eq!(records.len(), 1);

        let err = read_sam(Cursor::new("@HD\tVN:1.6\nbroken\n")).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
