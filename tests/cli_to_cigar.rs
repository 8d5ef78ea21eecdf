use assert_cmd::Command;
use std::path::PathBuf;

fn get_path(dir: &str, filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/splice");
    path.push(dir);
    path.push(filename);
    path
}

#[test]
fn command_to_cigar() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("samstitch")?;
    let output = cmd
        .arg("to-cigar")
        .arg(get_path("input", "chained.sam"))
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "cigar: chr2 10 60 + read1 0 50 + 50 M 50");
    assert_eq!(
        lines[1],
        "cigar: chr1 100 145 + read1 0 40 + 35 M 20 D 10 I 5 M 15"
    );
    assert_eq!(
        lines[2],
        "cigar: chr1 200 240 + read2 10 40 + 20 M 10 D 20 I 10 M 10"
    );

    Ok(())
}

#[test]
fn command_to_cigar_skips_unmapped() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("samstitch")?;
    let output = cmd
        .arg("to-cigar")
        .arg("stdin")
        .write_stdin("read3\t4\t*\t0\t0\t*\t*\t0\t0\tGATTACA\t*\n")
        .output()?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    Ok(())
}
