//! Propagation helpers and macros.
//!
//! # Usage
//!
//! ```rust
//! use oops::{define_errors, emit, wrap, Blame, Definition, Namespace, Reason, ResultExt};
//!
//! define_errors! {
//!     /// Order lookups that found nothing.
//!     pub ORDER_MISSING = Definition::classified(Blame::CLIENT, Namespace::SERVICE, Reason::RESOURCE_NOT_FOUND);
//!     STORE_READ = Definition::classified(Blame::SERVER, Namespace::STORE, Reason::DB_QUERY).with_trace();
//! }
//!
//! fn load(id: u64) -> oops::Result<String> {
//!     if id == 0 {
//!         return Err(emit!(ORDER_MISSING, "id={}", id));
//!     }
//!     std::fs::read_to_string("/definitely/not/here")
//!         .map_err(|e| wrap!(STORE_READ, e, "order {}", id))
//! }
//!
//! let err = load(7).explain("rendering invoice").unwrap_err();
//! assert!(err.is(&STORE_READ));
//! assert!(err.explanation().ends_with("order 7, rendering invoice"));
//!
//! assert_eq!(load(0).unwrap_err().explanation(), "id=0");
//! ```
//!
//! # Literal vs formatted text
//!
//! With a single string argument the text is taken literally, braces and
//! all. Interpolation happens only when arguments follow the format string.

use crate::aggregate::coerce_with;
use crate::definition::Definition;
use crate::instance::{Cause, Instance};
use crate::matching::{AsError, first_instance};
use crate::presets;
use std::error::Error;

/// Declare lazily built, process-wide definitions.
///
/// Each entry becomes a `static` [`LazyLock`](std::sync::LazyLock) holding a
/// [`Definition`]; it is built on first use and shared afterwards.
#[macro_export]
macro_rules! define_errors {
    ($( $(#[$meta:meta])* $vis:vis $name:ident = $init:expr; )+) => {
        $(
            $(#[$meta])*
            $vis static $name: ::std::sync::LazyLock<$crate::Definition> =
                ::std::sync::LazyLock::new(|| $init);
        )+
    };
}

/// Create an occurrence without a cause.
///
/// - `emit!(DEF)`: no explanation
/// - `emit!(DEF, "text")`: literal explanation
/// - `emit!(DEF, "fmt {}", args..)`: formatted explanation
#[macro_export]
macro_rules! emit {
    ($def:expr $(,)?) => {
        $crate::Definition::emit(&$def, "")
    };
    ($def:expr, $text:literal $(,)?) => {
        $crate::Definition::emit(&$def, $text)
    };
    ($def:expr, $fmt:literal, $($arg:tt)+) => {
        $crate::Definition::emitf(&$def, ::std::format_args!($fmt, $($arg)+))
    };
}

/// Create an occurrence caused by another error.
///
/// Same explanation forms as [`emit!`], after the cause.
#[macro_export]
macro_rules! wrap {
    ($def:expr, $cause:expr $(,)?) => {
        $crate::Definition::wrap(&$def, $cause, "")
    };
    ($def:expr, $cause:expr, $text:literal $(,)?) => {
        $crate::Definition::wrap(&$def, $cause, $text)
    };
    ($def:expr, $cause:expr, $fmt:literal, $($arg:tt)+) => {
        $crate::Definition::wrapf(&$def, $cause, ::std::format_args!($fmt, $($arg)+))
    };
}

/// Append a fragment to an instance's explanation.
#[macro_export]
macro_rules! explain {
    ($err:expr, $text:literal $(,)?) => {
        $crate::Instance::explain(&mut $err, $text)
    };
    ($err:expr, $fmt:literal, $($arg:tt)+) => {
        $crate::Instance::explainf(&mut $err, ::std::format_args!($fmt, $($arg)+))
    };
}

/// Turn any error into an [`Instance`].
///
/// Instances pass through untouched; anything else is wrapped by
/// [`presets::UNEXPECTED`] so downstream matching never has to special-case
/// foreign errors.
#[inline(never)]
pub fn coerce<E>(err: E) -> Instance
where
    E: Error + Send + Sync + 'static,
{
    coerce_with(err, &presets::UNEXPECTED, 1)
}

/// Short text for any error: `code explanation` for instances, the plain
/// message otherwise.
pub fn describe<E>(err: &E) -> String
where
    E: AsError + ?Sized,
{
    let err = err.as_error();
    match err.downcast_ref::<Instance>() {
        Some(instance) if instance.explanation().is_empty() => instance.code().to_string(),
        Some(instance) => format!("{} {}", instance.code(), instance.explanation()),
        None => match first_instance(err) {
            Some(instance) => format!("{} ({})", err, instance.code()),
            None => err.to_string(),
        },
    }
}

/// Explanation and classification helpers on `Result`.
pub trait ResultExt<T> {
    /// Append `text` to the error's explanation, coercing foreign errors.
    fn explain(self, text: &str) -> crate::Result<T>;

    /// Like [`ResultExt::explain`] with lazily built text.
    fn explain_with<F>(self, text: F) -> crate::Result<T>
    where
        F: FnOnce() -> String;

    /// Wrap the error with `definition`, keeping it as cause.
    fn or_wrap(self, definition: &Definition, text: &str) -> crate::Result<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    // No closures below: traces must start at the caller.
    #[inline(never)]
    fn explain(self, text: &str) -> crate::Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(coerce_with(err, &presets::UNEXPECTED, 1).explained(text)),
        }
    }

    #[inline(never)]
    fn explain_with<F>(self, text: F) -> crate::Result<T>
    where
        F: FnOnce() -> String,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(coerce_with(err, &presets::UNEXPECTED, 1).explained(&text())),
        }
    }

    #[inline(never)]
    fn or_wrap(self, definition: &Definition, text: &str) -> crate::Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let cause = Cause::from_error(err);
                Err(definition.spawn(Some(cause), 0).explained(text))
            }
        }
    }
}
