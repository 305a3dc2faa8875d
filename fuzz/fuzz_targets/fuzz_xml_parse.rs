#![no_main]
use jebixml::parser::ParseOptions;
use jebixml::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes go through encoding detection first.
    let _ = Document::parse(data, &ParseOptions::default());
    let _ = Document::parse(data, &ParseOptions::default().no_blanks(true).max_depth(64));
});
