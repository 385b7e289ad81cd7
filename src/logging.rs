//! Structured diagnostic view for in-process logging.
//!
//! # Scope
//!
//! The client-safe forms (`Display`, JSON) deliberately leave out the
//! property bag, the path arguments, the captured trace and the cause chain.
//! [`DiagnosticLog`] exposes all of it for operators:
//!
//! - borrows from the [`Instance`] and cannot outlive it
//! - accessors never allocate
//! - [`DiagnosticLog::write_to`] truncates every free-text field
//!
//! No sink is provided. Hand the view to whatever logger the service uses.

use crate::instance::Instance;
use crate::trace::Frame;
use serde_json::Value;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// Maximum length for any individual field in formatted output
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated strings
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Deepest cause rendered by [`DiagnosticLog::write_to`].
const MAX_CAUSE_DEPTH: usize = 16;

/// Borrowed diagnostic record of one instance.
///
/// ```rust
/// use oops::Definition;
///
/// let def = Definition::new().with_code("err_store").with_type("store");
/// let mut err = def.wrap(std::io::Error::other("disk full"), "saving order");
/// err.set_property("order_id", 991);
///
/// let mut line = String::new();
/// err.diagnostic_log().write_to(&mut line).unwrap();
/// assert!(line.starts_with("[err_store] type='store' explain='saving order'"));
/// assert!(line.contains(" order_id=991"));
/// assert!(line.contains(" cause[0]='disk full'"));
/// ```
#[derive(Clone, Copy)]
pub struct DiagnosticLog<'a> {
    instance: &'a Instance,
}

impl<'a> DiagnosticLog<'a> {
    pub(crate) fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Definition code.
    #[inline]
    pub fn code(&self) -> &'a str {
        self.instance.code()
    }

    /// Type label, empty when unset.
    #[inline]
    pub fn kind(&self) -> &'a str {
        self.instance.kind()
    }

    /// Full explanation, untruncated.
    #[inline]
    pub fn explanation(&self) -> &'a str {
        self.instance.explanation()
    }

    /// Rendered path, empty when unset.
    #[inline]
    pub fn path(&self) -> &'a str {
        self.instance.path()
    }

    /// Status code of the originating definition.
    #[inline]
    pub fn status_code(&self) -> Option<u16> {
        self.instance.status_code()
    }

    /// Property bag, unordered.
    #[inline]
    pub fn properties(&self) -> &'a [(String, Value)] {
        self.instance.property_slice()
    }

    /// Captured frames, empty when tracing is disabled.
    #[inline]
    pub fn trace(&self) -> &'a [Frame] {
        self.instance.trace()
    }

    /// Number of nested members.
    #[inline]
    pub fn nested_len(&self) -> usize {
        self.instance.nested().len()
    }

    /// Iterate the causal chain, closest cause first.
    pub fn causes(&self) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
        let first: Option<&'a (dyn Error + 'static)> = self.instance.source();
        std::iter::successors(first, |&err| err.source()).take(MAX_CAUSE_DEPTH)
    }

    /// Write the record as one structured line.
    ///
    /// Format:
    /// `[code] type='..' explain='..' path='..' status=N key=value.. nested=N cause[i]='..' frames=N`
    ///
    /// Empty parts are left out.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "[{}]", truncate_with_indicator(self.code()))?;

        if !self.kind().is_empty() {
            write!(f, " type='{}'", truncate_with_indicator(self.kind()))?;
        }
        if !self.explanation().is_empty() {
            write!(f, " explain='{}'", truncate_with_indicator(self.explanation()))?;
        }
        if !self.path().is_empty() {
            write!(f, " path='{}'", truncate_with_indicator(self.path()))?;
        }
        if let Some(status) = self.status_code() {
            write!(f, " status={}", status)?;
        }

        for (key, value) in self.properties() {
            let rendered = value.to_string();
            write!(
                f,
                " {}={}",
                truncate_with_indicator(key),
                truncate_with_indicator(&rendered)
            )?;
        }

        if self.nested_len() > 0 {
            write!(f, " nested={}", self.nested_len())?;
        }

        for (idx, cause) in self.causes().enumerate() {
            let rendered = cause.to_string();
            write!(f, " cause[{}]='{}'", idx, truncate_with_indicator(&rendered))?;
        }

        if !self.trace().is_empty() {
            write!(f, " frames={}", self.trace().len())?;
        }

        Ok(())
    }

    /// Multi-line dump including every captured frame.
    ///
    /// Only available with BOTH the `trusted_debug` feature AND debug
    /// assertions, so it cannot end up in a release build by accident.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail
        let _ = self.write_to(&mut output);

        for frame in self.trace() {
            output.push_str("\n    at ");
            output.push_str(&frame.to_string());
        }

        for member in self.instance.nested() {
            let nested = member.diagnostic_log().format_for_trusted_debug();
            for line in nested.lines() {
                output.push_str("\n  | ");
                output.push_str(line);
            }
        }

        output
    }
}

impl fmt::Debug for DiagnosticLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("code", &self.code())
            .field("kind", &self.kind())
            .field("properties", &self.properties().len())
            .field("frames", &self.trace().len())
            .finish()
    }
}

/// Truncate a string for display to bound log line size.
///
/// Returns a Cow<str> to avoid allocation when no truncation is needed.
fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}
