//! Parser fuzz target: feed the whole input to the data-response decoder, then,
//! when it is UTF-8, to the DDS parser and (if that succeeds) the DAS parser.
//! None of them may panic; they return Ok or Err.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let _ = dapclient::decode_data_response(data);
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(mut dataset) = dapclient::parse_dds(s) {
        let _ = dapclient::parse_das(s, &mut dataset);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
