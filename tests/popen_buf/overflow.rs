use super::open_with;
use crate::{tests::util::*, OpenMode, PipeErrorKind};
use color_eyre::eyre::ensure;
use std::io::Write;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn one_write_per_full_region() -> TestResult {
    testinit();
    let pipe = ScriptedPipe::new("");
    let record = pipe.record();
    let data = payload(600);
    let mut storage = [0u8; 512];
    let mut buf = open_with(&mut storage, pipe, OpenMode::WRITE)?;

    for &b in &data[..512] {
        buf.put_unit(b)?;
    }
    ensure_eq!(record.borrow().writes(), [0usize; 0], "a full region alone does not overflow");
    buf.put_unit(data[512])?;
    ensure_eq!(record.borrow().writes(), [512]);
    ensure_eq!(buf.pending_output(), 1);

    buf.write_units(&data[513..])?;
    ensure_eq!(record.borrow().writes(), [512]);
    ensure_eq!(buf.pending_output(), 88);

    buf.close()?;
    let record = record.borrow();
    ensure_eq!(record.writes(), [512, 88]);
    ensure_eq!(record.flushes(), 1);
    ensure_eq!(record.calls.last(), Some(&Call::Pclose));
    ensure_eq!(record.written, data);
    Ok(())
}

#[test]
fn unit_writes_never_lose_data() -> TestResult {
    testinit();
    let data = payload(97);
    for total in 1..=9 {
        for mode in [OpenMode::WRITE, OpenMode::READ_WRITE] {
            let pipe = ScriptedPipe::new("");
            let record = pipe.record();
            let mut storage = vec![0u8; total];
            let mut buf = open_with(&mut storage, pipe, mode)?;
            for &b in &data {
                buf.put_unit(b)?;
            }
            buf.close()?;
            ensure_eq!(record.borrow().written, data, "{total} units, {mode:?}");
        }
    }
    Ok(())
}

#[test]
fn slice_writes_never_lose_data() -> TestResult {
    testinit();
    let data = payload(1000);
    let pipe = ScriptedPipe::new("");
    let record = pipe.record();
    let mut storage = [0u8; 64];
    let mut buf = open_with(&mut storage, pipe, OpenMode::WRITE)?;
    for chunk in data.chunks(37) {
        buf.write_all(chunk)?;
    }
    buf.flush()?;
    let record = record.borrow();
    ensure!(record.writes().iter().rev().skip(1).all(|&n| n == 64));
    ensure_eq!(record.written, data);
    Ok(())
}

#[test]
fn zero_capacity_write_region_is_unbuffered() -> TestResult {
    testinit();
    let pipe = ScriptedPipe::new("");
    let record = pipe.record();
    let mut storage = [0u8; 1];
    let mut buf = open_with(&mut storage, pipe, OpenMode::READ_WRITE)?;
    ensure_eq!((buf.read_capacity(), buf.write_capacity()), (1, 0));

    buf.write_units(b"xyz")?;
    ensure_eq!(record.borrow().writes(), [1, 1, 1]);
    ensure_eq!(buf.pending_output(), 0);
    ensure_eq!(record.borrow().written, b"xyz");
    Ok(())
}

#[test]
fn failed_overflow_keeps_pending_output() -> TestResult {
    testinit();
    let faults = Faults { write: true, ..Faults::default() };
    let pipe = ScriptedPipe::new("").with_faults(faults);
    let record = pipe.record();
    let mut storage = [0u8; 4];
    let mut buf = open_with(&mut storage, pipe, OpenMode::WRITE)?;

    buf.write_units(b"abcd")?;
    ensure!(buf.put_unit(b'e').is_err());
    ensure_eq!(buf.pending_output(), 4);
    ensure_eq!(record.borrow().writes(), [4]);
    Ok(())
}

#[test]
fn failing_write_reports_accepted_prefix() -> TestResult {
    testinit();
    let faults = Faults { write: true, ..Faults::default() };
    let pipe = ScriptedPipe::new("").with_faults(faults);
    let record = pipe.record();
    let mut storage = [0u8; 4];
    let mut buf = open_with(&mut storage, pipe, OpenMode::WRITE)?;

    // The first four bytes fit in the region and count as written.
    ensure_eq!(Write::write(&mut buf, b"abcdef")?, 4);
    ensure_eq!(buf.pending_output(), 4);
    // With the region full, nothing more can be taken and the error comes through.
    ensure!(Write::write(&mut buf, b"ef").is_err());
    ensure_eq!(buf.pending_output(), 4);
    ensure!(buf.write_all(b"ef").is_err());
    ensure_eq!(record.borrow().writes(), [4, 4, 4]);
    ensure_eq!(record.borrow().written, b"", "nothing was sent twice");

    ensure!(buf.try_write_units(&[]).is_ok_and(|n| n == 0));
    Ok(())
}

#[test]
fn sync_writes_partial_region_then_flushes() -> TestResult {
    testinit();
    let pipe = ScriptedPipe::new("");
    let record = pipe.record();
    let mut storage = [0u8; 16];
    let mut buf = open_with(&mut storage, pipe, OpenMode::WRITE)?;

    buf.write_units(b"hello")?;
    buf.sync()?;
    ensure_eq!(record.borrow().calls[1..], [Call::Write(5), Call::Flush]);
    ensure_eq!(buf.pending_output(), 0);

    // Nothing pending: only the flush reaches the pipe.
    buf.sync()?;
    ensure_eq!(record.borrow().calls[3..], [Call::Flush]);
    Ok(())
}

#[test]
fn sync_flushes_even_if_write_fails() -> TestResult {
    testinit();
    let faults = Faults { write: true, ..Faults::default() };
    let pipe = ScriptedPipe::new("").with_faults(faults);
    let record = pipe.record();
    let mut storage = [0u8; 16];
    let mut buf = open_with(&mut storage, pipe, OpenMode::WRITE)?;

    buf.write_units(b"doomed")?;
    ensure!(buf.sync().is_err());
    ensure_eq!(record.borrow().calls[1..], [Call::Write(6), Call::Flush]);
    ensure_eq!(buf.pending_output(), 0, "the region is emptied regardless");
    Ok(())
}

#[test]
fn sync_without_write_mode_is_a_noop() -> TestResult {
    testinit();
    let pipe = ScriptedPipe::new("abc");
    let record = pipe.record();
    let mut storage = [0u8; 4];
    let mut buf = open_with(&mut storage, pipe, OpenMode::READ)?;
    buf.sync()?;
    ensure_eq!(record.borrow().calls.len(), 1);
    ensure_pipe_error(buf.put_unit(b'x'), PipeErrorKind::NotWritable)?;
    Ok(())
}
