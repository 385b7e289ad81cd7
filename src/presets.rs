//! Process-wide definitions shipped with the crate.

use crate::definition::Definition;
use crate::instance::Instance;
use crate::taxonomy::{Blame, Namespace, Reason};
use std::sync::LazyLock;

/// Code of the aggregation definition.
pub const MULTIPLE_CODE: &str = "MULTIPLE";

/// Default classification for anything that was not an [`Instance`] when it
/// was first seen (foreign errors, collector fallbacks).
///
/// Traced, so that non-exhaustive error handling can be located.
pub static UNEXPECTED: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::UNKNOWN, Namespace::UNKNOWN, Reason::UNEXPECTED).with_trace()
});

/// Placeholder while developing. Renders `TODO` or `TODO: <explanation>`.
///
/// Should never reach production; lint for it.
pub static TODO: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::DEVELOPER, Namespace::UNKNOWN, Reason::UNEXPECTED)
        .with_help("error 482, somebody just shot the server with a 12-gauge, please contact your administrator")
        .with_trace()
        .with_formatter(|err| match err.explanation() {
            "" => "TODO".to_string(),
            explanation => format!("TODO: {explanation}"),
        })
});

/// Aggregate produced by [`multi`](crate::aggregate::multi).
///
/// Renders `multiple errors (N): <m1>; <m2>; ...`.
pub static MULTIPLE: LazyLock<Definition> = LazyLock::new(|| {
    Definition::new()
        .with_code(MULTIPLE_CODE)
        .with_formatter(render_multiple)
});

fn render_multiple(err: &Instance) -> String {
    let members = err.nested();
    let mut out = format!("multiple errors ({})", members.len());
    for (idx, member) in members.iter().enumerate() {
        out.push_str(if idx == 0 { ": " } else { "; " });
        out.push_str(&member.render());
    }
    out
}
