//! End-to-end scenarios: a request handler validating input, a store layer
//! wrapping driver errors, and a boundary turning everything into a response.

use oops::{
    Blame, Cause, Definition, Instance, Namespace, Reason, Registry, ResultExt, define_errors,
    emit, json, matching, multi, presets, wrap,
};
use std::fmt;
use std::io;

define_errors! {
    INVALID_ORDER = Definition::classified(Blame::CLIENT, Namespace::API, Reason::REQUEST_VALIDATION_PARAMETERS)
        .with_help("fix the listed fields and retry");
    FIELD_REQUIRED = Definition::new().with_code("field_required").with_type("field").with_status(400);
    FIELD_RANGE = Definition::new().with_code("field_range").with_type("field").with_status(400);
    STORE_WRITE = Definition::classified(Blame::SERVER, Namespace::STORE, Reason::DB_EXEC).with_trace();
    STORE_TIMEOUT = Definition::classified(Blame::THIRD_PARTY, Namespace::STORE, Reason::TIMEOUT);
}

#[derive(Debug)]
struct DriverError {
    sqlstate: &'static str,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver rejected statement ({})", self.sqlstate)
    }
}

impl std::error::Error for DriverError {}

struct OrderInput<'a> {
    customer: &'a str,
    quantities: &'a [i64],
}

fn validate(input: &OrderInput<'_>) -> oops::Result<()> {
    let mut collector = INVALID_ORDER.collect();

    if input.customer.is_empty() {
        collector.add(emit!(FIELD_REQUIRED), "customer");
    }
    for (idx, qty) in input.quantities.iter().enumerate() {
        if !(1..=100).contains(qty) {
            collector.add_with(emit!(FIELD_RANGE, "got {}", qty), "items[{}].quantity", &[&idx]);
        }
    }

    match collector.finish() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn save(sqlstate: Option<&'static str>) -> oops::Result<u64> {
    match sqlstate {
        None => Ok(1),
        Some(sqlstate) => Err(wrap!(STORE_WRITE, DriverError { sqlstate }, "insert order")),
    }
}

fn place_order(input: &OrderInput<'_>, sqlstate: Option<&'static str>) -> oops::Result<u64> {
    validate(input)?;
    save(sqlstate).explain("placing order")
}

#[test]
fn validation_failures_are_collected_not_caused() {
    let input = OrderInput {
        customer: "",
        quantities: &[5, 0, 500],
    };
    let err = place_order(&input, None).unwrap_err();

    assert!(err.is(&INVALID_ORDER));
    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.nested().len(), 3);

    // Nested axis only
    assert!(matching::nested_is(&err, &FIELD_REQUIRED));
    assert!(matching::nested_is(&err, &FIELD_RANGE));
    assert!(!matching::is(&err, &FIELD_RANGE));

    let range = matching::nested_find(&err, &FIELD_RANGE).unwrap();
    assert_eq!(range.path(), "items[1].quantity");
    assert_eq!(range.path_args(), ["1"]);
    assert_eq!(range.explanation(), "got 0");
}

#[test]
fn validation_response_body() {
    let input = OrderInput {
        customer: "",
        quantities: &[7],
    };
    let err = validate(&input).unwrap_err();

    assert_eq!(
        err.to_json_value().unwrap(),
        serde_json::json!({
            "code": "CLIENT.API.REQUEST_VALIDATION_PARAMETERS",
            "help": "fix the listed fields and retry",
            "fields": [
                {"code": "field_required", "type": "field", "path": "customer"}
            ]
        })
    );
}

#[test]
fn store_failure_keeps_driver_cause() {
    let input = OrderInput {
        customer: "acme",
        quantities: &[1],
    };
    let err = place_order(&input, Some("23505")).unwrap_err();

    assert!(err.is(&STORE_WRITE));
    assert_eq!(err.explanation(), "insert order, placing order");
    assert_eq!(err.status_code(), Some(500));

    let driver = err.find_cause::<DriverError>().unwrap();
    assert_eq!(driver.sqlstate, "23505");
    assert!(matches!(err.cause(), Some(Cause::Foreign(_))));

    // Client output stays free of the driver message
    assert!(!err.to_json().unwrap().contains("23505"));
    assert!(!err.to_string().contains("23505"));

    // Operators see it
    let mut line = String::new();
    err.diagnostic_log().write_to(&mut line).unwrap();
    assert!(line.contains("driver rejected statement (23505)"));
}

#[cfg(feature = "trace")]
#[test]
fn traced_definition_captures_once() {
    let err = save(Some("40001")).unwrap_err();
    let frames = err.trace().len();
    assert!(frames > 0);

    let err = Err::<(), _>(err).explain("retrying").unwrap_err();
    assert_eq!(err.trace().len(), frames);
}

#[test]
fn successful_order() {
    let input = OrderInput {
        customer: "acme",
        quantities: &[1, 2, 3],
    };
    assert_eq!(place_order(&input, None).unwrap(), 1);
}

#[test]
fn look_alike_definitions_are_distinct() {
    let twin = Definition::classified(Blame::SERVER, Namespace::STORE, Reason::DB_EXEC).with_trace();
    let err = save(Some("x")).unwrap_err();

    assert_eq!(twin.code(), STORE_WRITE.code());
    assert!(!err.is(&twin));
    assert!(err.is(&STORE_WRITE));
}

#[test]
fn foreign_errors_become_unexpected() {
    let result: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
    let err = result.explain("streaming").unwrap_err();

    assert!(matching::find(&err, &presets::UNEXPECTED).is_some());
    assert!(matching::find(&err, &STORE_TIMEOUT).is_none());
    assert_eq!(err.to_string(), "UNKNOWN.UNKNOWN.UNEXPECTED : streaming");
}

#[test]
fn parallel_calls_join_into_multi() {
    let results: Vec<oops::Result<u64>> = vec![
        Ok(1),
        Err(STORE_TIMEOUT.emit("replica a")),
        Err(STORE_TIMEOUT.emit("replica b")),
        Ok(2),
    ];
    let err = multi(results.into_iter().map(Result::err)).unwrap();

    assert!(err.is(&presets::MULTIPLE));
    assert!(err.is(&STORE_TIMEOUT));
    assert_eq!(
        err.to_string(),
        "multiple errors (2): THIRD_PARTY.STORE.TIMEOUT : replica a; THIRD_PARTY.STORE.TIMEOUT : replica b"
    );
    assert_eq!(
        err.to_json_value().unwrap()["multi"],
        serde_json::json!([
            "THIRD_PARTY.STORE.TIMEOUT : replica a",
            "THIRD_PARTY.STORE.TIMEOUT : replica b"
        ])
    );
}

#[test]
fn json_adapter_feeds_collectors() {
    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Payload {
        count: u32,
    }

    let mut collector = INVALID_ORDER.collect();
    let payload: Option<Payload> = collector.check(json::decode::<Payload>(br#"{"count": -1}"#), "body");
    assert!(payload.is_none());

    let err = collector.finish().unwrap();
    assert!(matching::nested_is(&err, &json::DECODING));
    assert_eq!(err.nested()[0].path(), "body");
}

#[test]
fn registry_catalogues_service_errors() {
    let registry = Registry::builder()
        .with_presets()
        .unwrap()
        .register_all([&*INVALID_ORDER, &*FIELD_REQUIRED, &*FIELD_RANGE, &*STORE_WRITE, &*STORE_TIMEOUT])
        .unwrap()
        .register_all([&*json::INVALID, &*json::ENCODING, &*json::UNEXPECTED])
        .unwrap()
        .build();

    assert_eq!(registry.len(), 11);
    assert_eq!(registry.get("field_range"), Some(&*FIELD_RANGE));

    // Same code as json::INVALID, different definition
    let mut builder = Registry::builder();
    builder.register(&json::INVALID).unwrap();
    assert!(builder.register(&json::DECODING).is_err());
}

#[test]
fn nil_matches_only_nil() {
    let err: Option<&Instance> = None;
    assert!(matching::is_option(err, None));
    assert!(!matching::is_option(Some(&emit!(FIELD_REQUIRED)), None));
}
