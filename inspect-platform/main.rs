use popen_stream::{duplex_supported, WideUnit, DEFAULT_BUFFER_SIZE};
use std::mem::size_of;

macro_rules! sizes {
    ($($nam:ident),+ $(,)?) => {[$((stringify!($nam), ::std::mem::size_of::<$nam>())),+]};
}

fn maxlen<T>(a: &[(&str, T)]) -> usize { a.iter().map(|&(nm, _)| nm.len()).max().unwrap_or(0) }
fn print_sizes(sz: &[(&str, usize)]) {
    let width = maxlen(sz);
    sz.iter().for_each(|&(nm, sz)| println!("{nm:width$} : {sz:>3} bytes"));
}

fn main() {
    print_sizes(&sizes!(u8, WideUnit));
    println!("default buffer capacity : {DEFAULT_BUFFER_SIZE} units");
    println!("default wide buffer     : {} bytes", DEFAULT_BUFFER_SIZE * size_of::<WideUnit>());
    println!(
        "bidirectional popen     : {}",
        if duplex_supported() { "supported" } else { "unsupported" }
    );
}
