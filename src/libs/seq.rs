use anyhow::{bail, Context};
use indexmap::IndexMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Tells FASTQ from FASTA by the first byte, looking through gzip if needed.
pub fn is_fq<P: AsRef<Path>>(path: P) -> anyhow::Result<bool> {
    let path = path.as_ref();

    let mut buffer = [0; 2];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut buffer))
        .with_context(|| format!("could not read {}", path.display()))?;

    if buffer[0] == 0x1f && buffer[1] == 0x8b {
        let mut decoder = flate2::read::MultiGzDecoder::new(File::open(path)?);
        decoder
            .read_exact(&mut buffer[..1])
            .with_context(|| format!("could not decompress {}", path.display()))?;
    }

    match buffer[0] {
        b'>' => Ok(false),
        b'@' => Ok(true),
        _ => bail!("{} is neither FASTA nor FASTQ", path.display()),
    }
}

/// Loads every sequence of a FASTA or FASTQ file, keyed by name.
pub fn read_sequences(infile: &str) -> anyhow::Result<IndexMap<String, Vec<u8>>> {
    let mut seqs = IndexMap::new();

    if is_fq(infile)? {
        let mut fq_in = noodles_fastq::io::Reader::new(crate::reader(infile)?);
        for result in fq_in.records() {
            let record = result.with_context(|| format!("bad FASTQ record in {}", infile))?;
            let name = String::from_utf8(record.name().to_vec())?;
            seqs.insert(name, record.sequence().to_vec());
        }
    } else {
        let mut fa_in = noodles_fasta::io::Reader::new(crate::reader(infile)?);
        for result in fa_in.records() {
            let record = result.with_context(|| format!("bad FASTA record in {}", infile))?;
            let name = String::from_utf8(record.name().to_vec())?;
            seqs.insert(name, record.sequence().as_ref().to_vec());
        }
    }

    log::info!("{}: loaded {} sequences", infile, seqs.len());
    Ok(seqs)
}

/// Sequence lengths of a FASTA or FASTQ file, keyed by name.
pub fn read_lengths(infile: &str) -> anyhow::Result<IndexMap<String, u64>> {
    Ok(read_sequences(infile)?
        .into_iter()
        .map(|(name, seq)| (name, seq.len() as u64))
        .collect())
}

/// Reverse complement. IUPAC ambiguity codes other than N are kept as is.
pub fn rev_comp(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'a' => b't',
            b'c' => b'g',
            b'g' => b'c',
            b't' => b'a',
            other => other,
        })
        .collect()
}
