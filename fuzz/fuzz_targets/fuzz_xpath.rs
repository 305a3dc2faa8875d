#![no_main]
use jebixml::xpath::evaluate;
use jebixml::Document;
use libfuzzer_sys::fuzz_target;

const SAMPLE: &str = "<shelf id=\"s1\"><book lang=\"en\">One<!--c--></book>\
                      <book lang=\"fr\"><?pi data?>Deux</book><![CDATA[x]]></shelf>";

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        if let Ok(doc) = Document::parse_str(SAMPLE) {
            let _ = evaluate(&doc, doc.root(), expr);
            if let Some(shelf) = doc.root_element() {
                let _ = evaluate(&doc, shelf, expr);
            }
        }
    }
});
