use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use samstitch::libs::exonerate::PairwiseAlignment;
use samstitch::libs::sam::read_sam;
use std::io::Write;

pub fn make_subcommand() -> Command {
    Command::new("to-cigar")
        .about("Export the aligned part of each mapped record as an exonerate cigar line")
        .after_help(
            r###"
One line per mapped record, in input order, reference first:

  cigar: <ref> <start> <end> + <read> <start> <end> + <matches> M 20 I 1 ...

Coordinates are 0-based and end-exclusive; read coordinates are on the stored
SEQ (reverse complemented for reverse-strand records). Clips are left out.
Feed the lines to a realigner, then bring the result back with
`samstitch splice`.

Examples:
  samstitch to-cigar chained.sam -o chained.cigar
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
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let (_, sams) = read_sam(samstitch::reader(args.get_one::<String>("infile").unwrap())?)?;
    let mut writer = samstitch::writer(args.get_one::<String>("outfile").unwrap())?;

    for sam in sams.iter().filter(|s| !s.is_unmapped()) {
        let pa = PairwiseAlignment::from_record(&sam.to_alignment()?)?;
        writeln!(writer, "{}", pa)?;
    }
    writer.flush()?;

    Ok(())
}
