#![no_main]
use jebixml::serial::serialize;
use jebixml::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(doc) = Document::parse_str(s) {
            let first = serialize(&doc);
            let reparsed = Document::parse_str(&first).expect("serializer output must reparse");
            assert_eq!(first, serialize(&reparsed), "serialization is not a fixed point");
        }
    }
});
