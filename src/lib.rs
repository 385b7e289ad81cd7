//! # Oops
//!
//! Structured errors for backend services: every failure is an occurrence of
//! a small number of pre-declared definitions.
//!
//! ## Design Philosophy
//!
//! 1. **Definitions are templates**, built once at startup and never mutated
//! 2. **Instances are occurrences**, created at the failure site and carried upward
//! 3. **Identity classifies**: an instance matches the exact definition that
//!    created it, never a look-alike with the same code
//! 4. **Causes are never discarded**: wrapping keeps the original error reachable
//! 5. **Explanations only grow**: each layer appends context, nothing is replaced
//! 6. **Client output is safe**: `Display` and JSON never contain causes,
//!    traces or properties
//!
//! ## Quick Start
//!
//! ```rust
//! use oops::{Blame, Definition, Namespace, Reason, Result, ResultExt};
//! use std::sync::LazyLock;
//!
//! static INVALID_THRESHOLD: LazyLock<Definition> = LazyLock::new(|| {
//!     Definition::classified(Blame::CLIENT, Namespace::SETUP, Reason::VALIDATION)
//!         .with_help("threshold must be between 0 and 100")
//! });
//!
//! fn validate(threshold: f64) -> Result<()> {
//!     if !(0.0..=100.0).contains(&threshold) {
//!         return Err(INVALID_THRESHOLD.emitf(format_args!("threshold={}", threshold)));
//!     }
//!     Ok(())
//! }
//!
//! let err = validate(140.0).explain("loading config").unwrap_err();
//!
//! assert!(err.is(&INVALID_THRESHOLD));
//! assert_eq!(err.status_code(), Some(400));
//! assert_eq!(err.to_string(), "CLIENT.SETUP.VALIDATION : threshold=140, loading config");
//! assert_eq!(
//!     err.to_json().unwrap(),
//!     r#"{"code":"CLIENT.SETUP.VALIDATION","explain":"threshold=140, loading config","help":"threshold must be between 0 and 100"}"#
//! );
//! ```
//!
//! ## Two Axes
//!
//! The **causal chain** (`Error::source`) answers "what caused this";
//! **nested members** answer "what independent failures were gathered here".
//! [`matching::is`] / [`matching::find`] search the first,
//! [`matching::nested_is`] / [`matching::nested_find`] the second.
//!
//! ## Definitions Are Not Errors
//!
//! A definition cannot stand in for a live error:
//!
//! ```rust,compile_fail
//! use oops::Definition;
//!
//! let def = Definition::new().with_code("err_template");
//! let boxed: Box<dyn std::error::Error> = Box::new(def);
//! ```
//!
//! ```rust,compile_fail
//! use oops::Definition;
//!
//! let def = Definition::new().with_code("err_template");
//! let message = def.to_string();
//! ```
//!
//! ## Features
//!
//! - `trace` (default): capture call stacks for definitions built with
//!   [`Definition::with_trace`]
//! - `trusted_debug`: multi-line diagnostic dump, debug builds only

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod convenience;
pub mod definition;
pub mod instance;
pub mod json;
pub mod logging;
pub mod matching;
pub mod presets;
pub mod registry;
mod serialize;
pub mod taxonomy;
pub mod trace;

pub use aggregate::{Collector, multi};
pub use convenience::{ResultExt, coerce, describe};
pub use definition::{Classification, Definition, Formatter, Group};
pub use instance::{Cause, Instance, Multiple};
pub use logging::DiagnosticLog;
pub use matching::{AsError, find, is, is_option, nested_find, nested_is};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use taxonomy::{Blame, Namespace, Reason};
pub use trace::Frame;

/// Type alias for Results using our error type.
pub type Result<T> = std::result::Result<T, Instance>;
