use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use rayon::prelude::*;
use samstitch::libs::merge::chain_and_merge;
use samstitch::libs::record::{group_candidates, matched_bases, sort_for_output, AlignmentRecord};
use samstitch::libs::sam::{read_sam, SamRecord};
use samstitch::libs::seq::{read_lengths, read_sequences};
use std::collections::HashSet;
use std::io::Write;

pub fn make_subcommand() -> Command {
    Command::new("chain")
        .about("Chain each read's alignments into a single record per reference")
        .after_help(
            r###"
Processing:
  1. Group mapped records by (read name, reference name).
  2. In each group, find the highest-scoring chain of alignments that do not
     overlap in either the read or the reference, lie on one strand, and
     leave a combined gap of at most --max-gap between neighbours.
     The score of a chain is its number of matched bases.
  3. Merge the chain into one record: reference gaps become deletions, read
     gaps between fragments become insertions, the unaligned read ends are
     soft clipped. SEQ is the full read, reverse complemented on the
     reverse strand.
  4. Write the header and the merged records sorted by reference start/end.

Groups with malformed or unparsable alignments are skipped with a warning.

Examples:
  samstitch chain in.sam --reads reads.fq --ref ref.fa -o out.sam
  samstitch chain in.sam --reads reads.fa --ref ref.fa --max-gap 500 --parallel 4
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
            Arg::new("max_gap")
                .long("max-gap")
                .num_args(1)
                .default_value("200")
                .value_parser(value_parser!(u64))
                .help("Maximum combined read and reference gap between chained alignments"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads"),
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
    let reads_file = args.get_one::<String>("reads").unwrap();
    let ref_file = args.get_one::<String>("ref").unwrap();
    let max_gap = *args.get_one::<u64>("max_gap").unwrap();
    let parallel = *args.get_one::<usize>("parallel").unwrap();

    let (header, sams) = read_sam(samstitch::reader(infile)?)?;
    let reads = read_sequences(reads_file)?;
    let ref_lengths = read_lengths(ref_file)?;

    let mut mapped = Vec::new();
    let mut unreadable: HashSet<(String, String)> = HashSet::new();
    for sam in sams.iter().filter(|s| !s.is_unmapped()) {
        match sam.to_alignment() {
            Ok(record) => mapped.push(record),
            Err(e) => {
                log::warn!("Skipping {} on {}: {:#}", sam.qname, sam.rname, e);
                unreadable.insert((sam.qname.clone(), sam.rname.clone()));
            }
        }
    }
    let groups: Vec<((String, String), Vec<AlignmentRecord>)> = group_candidates(mapped)
        .into_iter()
        .filter(|(key, _)| !unreadable.contains(key))
        .collect();
    log::info!("{}: {} groups", infile, groups.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel)
        .build()?;

    let merged: Vec<Option<AlignmentRecord>> = pool.install(|| {
        groups
            .par_iter()
            .map(|((query_name, reference_name), candidates)| -> Result<Option<AlignmentRecord>> {
                let read = reads
                    .get(query_name)
                    .ok_or_else(|| anyhow!("Read {} not found in {}", query_name, reads_file))?;
                let reference_length = *ref_lengths.get(reference_name).ok_or_else(|| {
                    anyhow!("Reference {} not found in {}", reference_name, ref_file)
                })?;

                match chain_and_merge(
                    candidates,
                    reference_length,
                    read.len() as u64,
                    max_gap,
                    matched_bases,
                ) {
                    Ok(record) => Ok(Some(record)),
                    Err(e) if e.is_fatal() => Err(anyhow::Error::new(e))
                        .with_context(|| format!("merging {} on {}", query_name, reference_name)),
                    Err(e) => {
                        log::warn!("Skipping {} on {}: {}", query_name, reference_name, e);
                        Ok(None)
                    }
                }
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut records: Vec<AlignmentRecord> = merged.into_iter().flatten().collect();
    sort_for_output(&mut records);
    log::info!("{}: wrote {} merged records", infile, records.len());

    let mut writer = samstitch::writer(args.get_one::<String>("outfile").unwrap())?;
    for line in &header {
        writeln!(writer, "{}", line)?;
    }
    for record in &records {
        let read = reads
            .get(record.query_name())
            .ok_or_else(|| anyhow!("Read {} not found in {}", record.query_name(), reads_file))?;
        SamRecord::from_alignment(record, read).write_to(&mut writer)?;
    }
    writer.flush()?;

    Ok(())
}
