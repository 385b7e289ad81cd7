use oops::{Blame, Definition, Namespace, Reason, define_errors, emit, json, multi};

define_errors! {
    SIGNUP_INVALID = Definition::classified(Blame::CLIENT, Namespace::API, Reason::VALIDATION)
        .with_help("correct the highlighted fields");
}

// Field level definitions share type and status through a group.
static FIELDS: std::sync::LazyLock<oops::Group> = std::sync::LazyLock::new(|| {
    Definition::new()
        .with_type("field")
        .with_status(400)
        .group()
        .with_code_prefix("field_")
});

define_errors! {
    REQUIRED = FIELDS.code("required");
    TOO_SHORT = FIELDS.code("too_short");
}

#[derive(Debug, serde::Deserialize)]
#[allow(dead_code)]
struct Signup {
    email: String,
    password: String,
    tags: Vec<String>,
}

fn validate(body: &[u8]) -> oops::Result<Signup> {
    let mut collector = SIGNUP_INVALID.collect();

    let Some(signup) = collector.check(json::decode::<Signup>(body), "body") else {
        return Err(collector.finish().unwrap_or_else(|| emit!(SIGNUP_INVALID)));
    };

    if signup.email.is_empty() {
        collector.add(emit!(REQUIRED), "email");
    }
    if signup.password.len() < 12 {
        collector.add(emit!(TOO_SHORT, "min={} got={}", 12, signup.password.len()), "password");
    }
    for (idx, tag) in signup.tags.iter().enumerate() {
        if tag.is_empty() {
            collector.add_with(emit!(REQUIRED), "tags[{}]", &[&idx]);
        }
    }

    match collector.finish() {
        Some(err) => Err(err),
        None => Ok(signup),
    }
}

fn main() {
    println!("--- Validation Collect Example ---\n");

    let bodies: [&[u8]; 3] = [
        br#"{"email":"","password":"short","tags":["a",""]}"#,
        br#"{"email":"a@b.c","password":12}"#,
        br#"{"email":"a@b.c","password":"long enough pass","tags":[]}"#,
    ];

    let mut failures = Vec::new();
    for body in bodies {
        match validate(body) {
            Ok(signup) => println!("accepted: {}", signup.email),
            Err(err) => {
                println!("rejected ({:?}): {}", err.status_code(), err.to_json().unwrap_or_default());
                println!("  missing fields: {}", err.nested_is(&REQUIRED));
                println!("  bad json:       {}", err.nested_is(&json::DECODING));
                failures.push(err);
            }
        }
    }

    if let Some(all) = multi(failures) {
        println!("\nbatch: {}", all);
    }
}
