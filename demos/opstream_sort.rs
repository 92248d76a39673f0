//{
fn main() -> std::io::Result<()> {
    //}
    use {
        popen_stream::{OpStream, OpenMode},
        std::io::prelude::*,
    };

    let mut child = OpStream::spawn("sort", OpenMode::WRITE)?;

    for word in ["pear", "apple", "quince", "fig"] {
        // Buffered; sort sees nothing until the buffer fills up or the stream is flushed.
        writeln!(child, "{word}")?;
    }

    // Closing flushes what is still buffered, which lets sort see end-of-input and print.
    child.close()?;
    //{
    Ok(())
} //}
