use anyhow::{anyhow, bail, Result};
use clap::{Arg, ArgMatches, Command};
use samstitch::libs::sam::read_sam;
use samstitch::libs::seq::read_lengths;
use std::io::Write;

pub fn make_subcommand() -> Command {
    Command::new("check")
        .about("Check mapped records against read and reference lengths")
        .after_help(
            r###"
For every mapped record, checks that:
  1. the M/D operations add up to the reference span
  2. the M/I/S operations add up to the read length
  3. there are no hard clips
  4. the alignment lies inside the reference
  5. the aligned read interval lies inside the read
  6. soft clips appear only at the ends

Prints `<read>\t<reference>\t<pos>\tOK` or the failure for each record, and
exits with an error if any record fails.

Examples:
  samstitch check out.sam --reads reads.fq --ref ref.fa
"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input SAM file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("reads")
                .long("reads")
                .short('r')
                .required(true)
                .num_args(1)
                .help("Reads in FASTQ or FASTA format"),
        )
        .arg(
            Arg::new("ref")
                .long("ref")
                .required(true)
                .num_args(1)
                .help("Reference sequences in FASTA format"),
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
    let reads_file = args.get_one::<String>("reads").unwrap();
    let ref_file = args.get_one::<String>("ref").unwrap();

    let (_, sams) = read_sam(samstitch::reader(args.get_one::<String>("infile").unwrap())?)?;
    let query_lengths = read_lengths(reads_file)?;
    let ref_lengths = read_lengths(ref_file)?;

    let mut writer = samstitch::writer(args.get_one::<String>("outfile").unwrap())?;
    let mut failed = 0;
    let mut total = 0;
    for sam in sams.iter().filter(|s| !s.is_unmapped()) {
        let record = sam.to_alignment()?;
        let query_length = *query_lengths
            .get(record.query_name())
            .ok_or_else(|| anyhow!("Read {} not found in {}", record.query_name(), reads_file))?;
        let reference_length = *ref_lengths.get(record.reference_name()).ok_or_else(|| {
            anyhow!("Reference {} not found in {}", record.reference_name(), ref_file)
        })?;

        let status = match record.validate(reference_length, query_length) {
            Ok(()) => "OK".to_string(),
            Err(e) => {
                failed += 1;
                e.to_string()
            }
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            record.query_name(),
            record.reference_name(),
            sam.pos,
            status
        )?;
        total += 1;
    }
    writer.flush()?;

    if failed > 0 {
        bail!("{} of {} records failed", failed, total);
    }

    Ok(())
}
