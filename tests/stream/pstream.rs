use crate::{duplex_supported, tests::util::*, OpenMode, PStream, PipeErrorKind};
use color_eyre::eyre::ensure;
use std::io::prelude::*;

#[test]
fn round_trip() -> TestResult {
    testinit();
    if !duplex_supported() {
        let result = PStream::spawn("cat", OpenMode::READ_WRITE);
        ensure_pipe_error(result, PipeErrorKind::DuplexUnsupported)?;
        return Ok(());
    }
    let mut child = PStream::spawn("cat", OpenMode::NONE)?;
    ensure_eq!(child.rdbuf().mode(), OpenMode::READ_WRITE);
    // Every refill waits for a full read region, and cat never sees end of input while we hold
    // its stdin, so the echo has to fill whole regions.
    let len = 2 * child.rdbuf().read_capacity();
    let data = (0..len).map(|i| b'0' + (i % 10) as u8).collect::<Vec<_>>();
    child.write_all(&data)?;
    child.flush()?;

    let mut echoed = vec![0; data.len()];
    child.read_exact(&mut echoed)?;
    ensure_eq!(echoed, data);
    Ok(())
}

#[test]
fn failed_open_sets_failure_flag() -> TestResult {
    testinit();
    let mut child = PStream::new();
    let result = if duplex_supported() {
        child.open("echo \0", OpenMode::READ_WRITE)
    } else {
        child.open("cat", OpenMode::READ_WRITE)
    };
    ensure!(result.is_err());
    ensure!(child.fail() && !child.is_open());
    Ok(())
}

#[test]
fn write_after_child_hangs_up() -> TestResult {
    testinit();
    if !duplex_supported() {
        return Ok(());
    }
    let mut child = PStream::spawn(r#"read line; echo "$line""#, OpenMode::NONE)?;
    child.write_all(b"hi\n")?;
    child.flush()?;

    let mut echoed = Vec::new();
    child.read_to_end(&mut echoed)?;
    ensure_eq!(echoed, b"hi\n");
    ensure!(child.eof() && !child.fail());

    child.put(b'x')?;
    ensure_pipe_error(child.flush(), PipeErrorKind::WritePastEnd)?;
    ensure!(child.fail());
    Ok(())
}
