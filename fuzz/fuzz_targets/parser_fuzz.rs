//! Parser fuzz target: feed arbitrary text to the UDT parser.
//! The parser must not panic; it returns Ok(UdtType) or Err(UdtError). Every
//! parsed tree is sized, flattened and written back.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    // references resolve against a directory that does not exist
    if let Ok(udt) = udtdef::parse(s, "/nonexistent") {
        let _ = udt.plain_size();
        let _ = udt.packed_size();
        let _ = udt.flatten();
        let text = udtdef::serialize(&udt);
        let again = udtdef::parse(&text, "/nonexistent").expect("serialized tree parses");
        assert_eq!(again, udt);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
