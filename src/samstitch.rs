extern crate clap;
use clap::*;

mod cmd_samstitch;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let app = Command::new("samstitch")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`samstitch` - Chain fragmentary SAM alignments and splice refined ones back in")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_samstitch::chain::make_subcommand())
        .subcommand(cmd_samstitch::splice::make_subcommand())
        .subcommand(cmd_samstitch::to_cigar::make_subcommand())
        .subcommand(cmd_samstitch::check::make_subcommand())
        .after_help(
            r###"Subcommands:

* chain    - Stitch each read's alignments into one record per reference
* splice   - Replace aligned interiors with realigned ones, keeping clips
* to-cigar - Export aligned interiors as exonerate cigar lines
* check    - Validate records against read and reference lengths

Set RUST_LOG=info (or debug) for progress messages.

"###,
        );

    match app.get_matches().subcommand() {
        Some(("chain", sub_matches)) => cmd_samstitch::chain::execute(sub_matches),
        Some(("splice", sub_matches)) => cmd_samstitch::splice::execute(sub_matches),
        Some(("to-cigar", sub_matches)) => cmd_samstitch::to_cigar::execute(sub_matches),
        Some(("check", sub_matches)) => cmd_samstitch::check::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
