#![no_main]

use libfuzzer_sys::fuzz_target;
use oops::Definition;
use std::sync::LazyLock;

static TARGET: LazyLock<Definition> = LazyLock::new(|| Definition::new().with_code("fuzz"));

// Arbitrary explanation, path and property text never breaks the bounded log line.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut parts = text.splitn(3, '\u{0}');
    let explanation = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();
    let property = parts.next().unwrap_or_default();

    let mut err = TARGET.emit(explanation);
    err.set_path(path, &[&property]).set_property(property, explanation);

    let mut line = String::new();
    err.diagnostic_log().write_to(&mut line).expect("writing to a String");
    assert!(line.len() < 5 * 1024);
});
