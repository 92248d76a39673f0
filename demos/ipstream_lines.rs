//{
fn main() -> std::io::Result<()> {
    //}
    use {
        popen_stream::{IpStream, OpenMode},
        std::io::prelude::*,
    };

    // The command line is handed to the shell as is.
    let mut child = IpStream::spawn("ls -1", OpenMode::READ)?;

    // BufRead comes straight from the stream buffer, so no BufReader is needed on top.
    for (i, line) in (&mut child).lines().enumerate() {
        println!("{i:>3}: {}", line?);
    }

    // Reap the child and find out how it went.
    let status = child.close()?;
    println!("ls exited with {status}");
    //{
    Ok(())
} //}
