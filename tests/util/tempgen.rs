use super::Xorshift32;
use std::{fs, path::PathBuf};

/// A file in the temporary directory that a child process can write into. Removed on drop.
#[derive(Debug)]
pub struct TempFile(PathBuf);
impl TempFile {
    pub fn new(id: &'static str) -> Self {
        let mut rng = Xorshift32::from_id(id);
        let name = format!("popen-stream-test-{:08x}.out", rng.next());
        Self(std::env::temp_dir().join(name))
    }
    /// The path, quoted for the shell.
    pub fn quoted(&self) -> String {
        let path = self.0.to_string_lossy().replace('\'', r"'\''");
        format!("'{path}'")
    }
    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.0)
    }
}
impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

macro_rules! make_id {
    () => {
        concat!(file!(), line!(), column!())
    };
}
