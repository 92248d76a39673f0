use crate::{tests::util::*, IpStream, OpenMode, PipeErrorKind, WIpStream, WideUnit};
use color_eyre::eyre::ensure;
use std::{fmt::Write as _, io::prelude::*};

#[test]
fn three_units_then_end() -> TestResult {
    testinit();
    let mut child = IpStream::spawn("printf abc", OpenMode::READ)?;
    ensure!(child.is_open() && child.good());
    ensure_eq!(child.get()?, Some(b'a'));
    ensure_eq!(child.get()?, Some(b'b'));
    ensure_eq!(child.get()?, Some(b'c'));
    ensure!(!child.eof());
    ensure_eq!(child.get()?, None);
    ensure!(child.eof() && !child.fail());
    ensure!(child.close()?.success());
    ensure!(!child.is_open());
    Ok(())
}

#[test]
fn lines() -> TestResult {
    testinit();
    let mut child = IpStream::spawn(r"printf 'one\ntwo\nthree\n'", OpenMode::READ)?;
    let lines = (&mut child).lines().collect::<Result<Vec<_>, _>>()?;
    ensure_eq!(lines, ["one", "two", "three"]);
    ensure!(child.eof());
    child.close()?;
    Ok(())
}

#[test]
fn output_larger_than_buffer() -> TestResult {
    testinit();
    let mut child = IpStream::new();
    child.open("seq 1 5000", OpenMode::NONE)?;
    ensure_eq!(child.rdbuf().mode(), OpenMode::READ, "reading is always requested");

    let mut out = String::new();
    child.read_to_string(&mut out)?;
    let mut expected = String::new();
    for i in 1..=5000 {
        writeln!(expected, "{i}")?;
    }
    ensure_eq!(out, expected);
    child.close()?;
    Ok(())
}

#[test]
fn peek() -> TestResult {
    testinit();
    let mut child = IpStream::spawn("printf z", OpenMode::READ)?;
    ensure_eq!(child.peek()?, Some(b'z'));
    ensure_eq!(child.get()?, Some(b'z'));
    ensure_eq!(child.peek()?, None);
    ensure!(child.eof());
    Ok(())
}

#[test]
fn wide_units() -> TestResult {
    testinit();
    let units: [WideUnit; 2] = [0x41, 0x263A];
    let mut command = String::from("printf '");
    for b in units.iter().flat_map(|u| u.to_ne_bytes()) {
        write!(command, r"\{b:03o}")?;
    }
    command.push('\'');

    let mut child = WIpStream::spawn(&command, OpenMode::READ)?;
    let mut out = [0; 4];
    ensure_eq!(child.read_units(&mut out)?, 2);
    ensure_eq!(out[..2], units);
    ensure_eq!(child.get()?, None);
    child.close()?;
    Ok(())
}

#[test]
fn failure_flags() -> TestResult {
    testinit();
    let mut child = IpStream::new();
    ensure_pipe_error(child.close(), PipeErrorKind::NotOpen)?;
    ensure!(child.fail() && !child.good());
    child.clear();
    ensure!(child.good());

    ensure!(child.open("echo \0", OpenMode::READ).is_err());
    ensure!(child.fail() && !child.is_open());
    child.clear();

    ensure_pipe_error(child.get(), PipeErrorKind::NotOpen)?;
    ensure!(child.fail());
    Ok(())
}

#[test]
fn exit_status() -> TestResult {
    testinit();
    let mut child = IpStream::spawn("echo gone; exit 7", OpenMode::READ)?;
    let mut line = String::new();
    child.read_line(&mut line)?;
    ensure_eq!(line, "gone\n");
    ensure_eq!(child.close()?.code(), Some(7));
    ensure!(!child.fail(), "a nonzero exit is not a failure");
    Ok(())
}
