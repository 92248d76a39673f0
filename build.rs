use std::{
    env::{var as env_var, var_os as env_var_os},
    fs,
    io::{self, Write},
    path::PathBuf,
};

const BUFFER_SIZE_VAR: &str = "POPEN_STREAM_BUFFER_SIZE";
const DEFAULT_BUFFER_SIZE: usize = 512;

fn main() {
    println!("cargo:rerun-if-env-changed={BUFFER_SIZE_VAR}");
    println!("cargo:rerun-if-changed=build.rs");
    write_config(buffer_size());
    if is_unix() {
        let target = TargetTriplet::fetch();
        collect_popen_features(&target);
    }
}

fn is_unix() -> bool {
    env_var_os("CARGO_CFG_UNIX").is_some()
}

/// Reads the default backing buffer capacity, in units, from the environment.
fn buffer_size() -> usize {
    let Ok(val) = env_var(BUFFER_SIZE_VAR) else { return DEFAULT_BUFFER_SIZE };
    match val.trim().parse::<usize>() {
        Ok(n) if n >= 1 => n,
        Ok(_) => panic!("{BUFFER_SIZE_VAR} must be greater than or equal to 1"),
        Err(e) => panic!("{BUFFER_SIZE_VAR} is not a valid unsigned integer: {e}"),
    }
}

fn write_config(buffer_size: usize) {
    let out = PathBuf::from(env_var_os("OUT_DIR").unwrap()).join("config.rs");
    let src = format!("pub(crate) const CONFIGURED_BUFFER_SIZE: usize = {buffer_size};\n");
    fs::write(out, src).unwrap();
}

/// This can define the following:
/// - `popen_duplex`, on systems whose `popen` accepts the `"r+"` mode and hands back a
///   bidirectional stream (the BSD family, including Apple platforms)
#[rustfmt::skip]
fn collect_popen_features(target: &TargetTriplet) {
    if target.os_any(&["macos", "ios", "freebsd", "dragonfly", "netbsd", "openbsd"]) {
        define("popen_duplex");
    }
}

fn define(cfg: &str) {
    ldefine(&[cfg]);
}
fn ldefine(cfgs: &[&str]) {
    let stdout_ = io::stdout();
    let mut stdout = stdout_.lock();
    for i in cfgs {
        stdout.write_all(b"cargo:rustc-cfg=").unwrap();
        stdout.write_all(i.as_ref()).unwrap();
        stdout.write_all(b"\n").unwrap();
    }
}

struct TargetTriplet {
    os: String,
}
#[rustfmt::skip]
impl TargetTriplet {
    fn fetch() -> Self {
        Self { os: env_var("CARGO_CFG_TARGET_OS").unwrap() }
    }
    fn os_any(&self, oses: &[&str]) -> bool { oses.iter().copied().any(|x| x == self.os) }
}
