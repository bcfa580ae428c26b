//! Definition parser fuzz target: feed arbitrary bytes to the reader.
//! The parser must not panic; it should return Ok(DefForest) or Err(DefError).
//! Build with: cargo fuzz run def_parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(forest) = cmtdef::parse_def(s) {
        let rendered = cmtdef::render_source(&forest);
        let _ = cmtdef::parse_def(&rendered);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run def_parser_fuzz");
}
