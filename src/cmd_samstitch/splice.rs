use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use samstitch::libs::exonerate::PairwiseAlignment;
use samstitch::libs::sam::read_sam;
use samstitch::libs::splice::splice;
use std::io::{BufRead, Write};

pub fn make_subcommand() -> Command {
    Command::new("splice")
        .about("Replace the aligned part of each record with a realigned one")
        .after_help(
            r###"
The alignments file holds one exonerate `cigar:` line per mapped SAM record,
in the same order, as written by a realigner fed with `samstitch to-cigar`:

  cigar: <ref> <start> <end> + <read> <start> <end> + <score> M 20 I 1 M 9 ...

Each mapped record keeps its position, flags, sequence and soft clips; only
the operations between the clips are replaced. The replacement must cover
exactly the read and reference bases the record aligned.

Unmapped records are written unchanged and do not consume a cigar line.
The command stops at the first record that does not reconcile, and when one
of the two streams ends before the other.

Examples:
  samstitch splice chained.sam realigned.cigar -o out.sam
"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input SAM file"),
        )
        .arg(
            Arg::new("alignments")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Realigned exonerate cigar lines"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let alignments = args.get_one::<String>("alignments").unwrap();

    let (header, sams) = read_sam(samstitch::reader(infile)?)?;

    let mut pairwise = samstitch::reader(alignments)?
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()));

    let mut writer = samstitch::writer(args.get_one::<String>("outfile").unwrap())?;
    for line in &header {
        writeln!(writer, "{}", line)?;
    }

    let mut count = 0;
    for sam in &sams {
        if sam.is_unmapped() {
            sam.write_to(&mut writer)?;
            continue;
        }

        let line = match pairwise.next() {
            Some(line) => line?,
            None => bail!(
                "{} ended before record {} ({})",
                alignments,
                count + 1,
                sam.qname
            ),
        };
        let pa: PairwiseAlignment = line
            .parse()
            .with_context(|| format!("{}: alignment {}", alignments, count + 1))?;

        let query_length = match sam.seq_len() {
            Some(len) => len,
            None => bail!("{} has no SEQ to take the read length from", sam.qname),
        };
        let original = sam.to_alignment()?;
        let spliced = splice(&original, &pa.ops, query_length)
            .with_context(|| format!("splicing record {} ({})", count + 1, sam.qname))?;

        sam.with_alignment(&spliced).write_to(&mut writer)?;
        count += 1;
    }

    if pairwise.next().is_some() {
        bail!("{} has more alignments than {} has mapped records", alignments, infile);
    }
    log::info!("{}: spliced {} records", infile, count);
    writer.flush()?;

    Ok(())
}
