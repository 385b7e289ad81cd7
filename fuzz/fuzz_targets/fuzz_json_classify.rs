#![no_main]

use libfuzzer_sys::fuzz_target;
use oops::json;

// Every decoding failure lands in exactly one adapter classification and
// cites an offset inside the input.
fuzz_target!(|data: &[u8]| {
    let Err(err) = json::decode::<serde_json::Value>(data) else {
        return;
    };

    let hits = [&json::INVALID, &json::DECODING, &json::UNEXPECTED]
        .into_iter()
        .filter(|def| err.is(def))
        .count();
    assert_eq!(hits, 1, "{}", err);

    if let Some(rest) = err.explanation().strip_prefix("check byte at index=") {
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        let offset: usize = digits.parse().expect("numeric offset");
        assert!(offset <= data.len());
    }

    let _ = err.to_json().expect("client form always serializes");
});
