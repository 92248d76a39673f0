use crate::{tests::util::*, OpStream, OpenMode, PipeErrorKind, WOpStream, WideUnit};
use color_eyre::eyre::ensure;
use std::io::prelude::*;

#[test]
fn reaches_child() -> TestResult {
    testinit();
    let out = TempFile::new(make_id!());
    let mut child = OpStream::spawn(format!("cat > {}", out.quoted()), OpenMode::WRITE)?;
    let data = (0..600).map(|i| b'a' + (i % 26) as u8).collect::<Vec<_>>();
    for &b in &data {
        child.put(b)?;
    }
    // A full region is only written out when the next unit arrives.
    let cap = child.rdbuf().write_capacity();
    ensure_eq!(child.rdbuf().pending_output(), (data.len() - 1) % cap + 1);
    ensure!(child.close()?.success());
    ensure_eq!(out.read()?, data);
    Ok(())
}

#[test]
fn formatted_output() -> TestResult {
    testinit();
    let out = TempFile::new(make_id!());
    let mut child = OpStream::new();
    child.open(format!("sort > {}", out.quoted()), OpenMode::NONE)?;
    ensure_eq!(child.rdbuf().mode(), OpenMode::WRITE, "writing is always requested");
    for word in ["pear", "apple", "fig"] {
        writeln!(child, "{word}")?;
    }
    child.close()?;
    ensure_eq!(out.read()?, b"apple\nfig\npear\n");
    Ok(())
}

#[test]
fn flush_delivers_without_closing() -> TestResult {
    testinit();
    let out = TempFile::new(make_id!());
    let mut child = OpStream::spawn(format!("cat > {}", out.quoted()), OpenMode::WRITE)?;
    child.write_all(b"early")?;
    child.flush()?;
    ensure_eq!(child.rdbuf().pending_output(), 0);
    child.write_all(b" late")?;
    child.close()?;
    ensure_eq!(out.read()?, b"early late");
    Ok(())
}

#[test]
fn drop_flushes() -> TestResult {
    testinit();
    let out = TempFile::new(make_id!());
    {
        let mut child = OpStream::spawn(format!("cat > {}", out.quoted()), OpenMode::WRITE)?;
        child.write_all(b"kept")?;
    }
    ensure_eq!(out.read()?, b"kept");
    Ok(())
}

#[test]
fn wide_units() -> TestResult {
    testinit();
    let out = TempFile::new(make_id!());
    let mut child = WOpStream::spawn(format!("cat > {}", out.quoted()), OpenMode::WRITE)?;
    let units: [WideUnit; 3] = [0x48, 0x49, 0x2603];
    child.write_units(&units)?;
    child.close()?;
    let expected = units.iter().flat_map(|u| u.to_ne_bytes()).collect::<Vec<_>>();
    ensure_eq!(out.read()?, expected);
    Ok(())
}

#[test]
#[cfg(not(popen_duplex))]
fn read_mode_makes_it_duplex() -> TestResult {
    testinit();
    let mut child = OpStream::new();
    ensure_pipe_error(child.open("cat", OpenMode::READ), PipeErrorKind::DuplexUnsupported)?;
    ensure!(child.fail() && !child.is_open());
    Ok(())
}

#[test]
fn close_when_closed() -> TestResult {
    testinit();
    let mut child = OpStream::spawn("cat >/dev/null", OpenMode::WRITE)?;
    child.close()?;
    ensure!(child.good());
    ensure_pipe_error(child.close(), PipeErrorKind::NotOpen)?;
    ensure!(child.fail());
    Ok(())
}
