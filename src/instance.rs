//! Live error occurrences.
//!
//! An [`Instance`] is created by a [`Definition`] at the failure site and then
//! carried upward. Along the way each layer may append to its explanation,
//! attribute it to an input path, attach properties, or nest sibling failures.
//!
//! # Memory hygiene
//!
//! Explanation and path text often quote user input. Both buffers are
//! zeroized when the instance drops.

use crate::definition::{Classification, Definition};
use crate::logging::DiagnosticLog;
use crate::trace::{Frame, Trace};
use serde_json::Value;
use smallvec::SmallVec;
use std::error::Error;
use std::fmt::{self, Write as _};
use zeroize::Zeroizing;

/// Property bag storage: small, unordered, last write wins.
pub(crate) type Properties = SmallVec<[(String, Value); 4]>;

/// Separator between explanation fragments.
pub const EXPLANATION_SEPARATOR: &str = ", ";

pub(crate) fn put_property(properties: &mut Properties, key: String, value: Value) {
    match properties.iter_mut().find(|(k, _)| *k == key) {
        Some((_, slot)) => *slot = value,
        None => properties.push((key, value)),
    }
}

// ============================================================================
// Cause
// ============================================================================

/// The upstream error an instance was wrapped around.
///
/// The set of variants is closed: a classified instance, a foreign error, or
/// an aggregate of several instances.
#[derive(Debug, Clone)]
pub enum Cause {
    /// Another classified occurrence.
    Instance(Box<Instance>),
    /// Any error not produced by this crate.
    Foreign(std::sync::Arc<dyn Error + Send + Sync>),
    /// Several independent occurrences.
    Multiple(Multiple),
}

impl Cause {
    pub(crate) fn from_error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(err))
    }

    pub(crate) fn from_boxed(err: Box<dyn Error + Send + Sync>) -> Self {
        let err = match err.downcast::<Instance>() {
            Ok(instance) => return Self::Instance(instance),
            Err(other) => other,
        };
        match err.downcast::<Multiple>() {
            Ok(multiple) => Self::Multiple(*multiple),
            Err(other) => Self::Foreign(other.into()),
        }
    }

    /// The cause as a plain error.
    pub fn as_error(&self) -> &(dyn Error + 'static) {
        match self {
            Self::Instance(instance) => &**instance,
            Self::Foreign(err) => &**err,
            Self::Multiple(multiple) => multiple,
        }
    }

    /// The cause when it is a classified occurrence.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_error(), f)
    }
}

// ============================================================================
// Multiple
// ============================================================================

/// Container of independent occurrences, used as the cause of an aggregate.
///
/// Matching treats it as unwrapping to many errors at once.
#[derive(Debug, Clone)]
pub struct Multiple(Vec<Instance>);

impl Multiple {
    pub(crate) fn new(members: Vec<Instance>) -> Self {
        Self(members)
    }

    /// Aggregated members, in insertion order.
    #[inline]
    pub fn members(&self) -> &[Instance] {
        &self.0
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over members.
    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.0.iter()
    }

    /// Take the members out.
    pub fn into_members(self) -> Vec<Instance> {
        self.0
    }
}

impl fmt::Display for Multiple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multiple errors {}", self.0.len())
    }
}

impl Error for Multiple {}

impl<'a> IntoIterator for &'a Multiple {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Instance
// ============================================================================

/// One concrete occurrence of a defined failure.
///
/// # Ownership
///
/// Exactly one call frame owns an instance while it is being built up
/// (explanation, path, properties, nested members). Once returned to a
/// caller it should be treated as read-only.
#[derive(Clone)]
#[must_use = "errors should be handled or returned"]
pub struct Instance {
    source: Definition,
    cause: Option<Cause>,
    nested: Vec<Instance>,
    explanation: Zeroizing<String>,
    path: Zeroizing<String>,
    path_args: Vec<String>,
    properties: Properties,
    trace: Option<Trace>,
}

impl Instance {
    pub(crate) fn from_parts(source: Definition, cause: Option<Cause>, trace: Option<Trace>) -> Self {
        let properties = source.default_properties().clone();
        Self {
            source,
            cause,
            nested: Vec::new(),
            explanation: Zeroizing::new(String::new()),
            path: Zeroizing::new(String::new()),
            path_args: Vec::new(),
            properties,
            trace,
        }
    }

    // ------------------------------------------------------------------------
    // Classification readers
    // ------------------------------------------------------------------------

    /// The definition that created this occurrence.
    #[inline]
    pub fn definition(&self) -> &Definition {
        &self.source
    }

    /// Code of the originating definition.
    #[inline]
    pub fn code(&self) -> &str {
        self.source.code()
    }

    /// Type of the originating definition, empty when unset.
    #[inline]
    pub fn kind(&self) -> &str {
        self.source.kind()
    }

    /// Help text of the originating definition, empty when unset.
    #[inline]
    pub fn help(&self) -> &str {
        self.source.help()
    }

    /// Classification of the originating definition.
    pub fn classification(&self) -> Classification<'_> {
        self.source.classification()
    }

    /// Status of the originating definition.
    pub fn status_code(&self) -> Option<u16> {
        self.source.status_code()
    }

    /// Whether both occurrences come from the same definition.
    pub fn same_classification(&self, other: &Instance) -> bool {
        self.source == other.source
    }

    // ------------------------------------------------------------------------
    // Explanation
    // ------------------------------------------------------------------------

    /// The accumulated explanation, fragments joined by `", "`.
    #[inline]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Append a literal fragment. Empty text is ignored.
    ///
    /// ```rust
    /// use oops::Definition;
    ///
    /// let def = Definition::new().with_code("err_test");
    /// let mut err = def.emit("foo");
    /// err.explain("baz").explain("");
    /// oops::explain!(err, "id={}", 123);
    ///
    /// assert_eq!(err.explanation(), "foo, baz, id=123");
    /// ```
    pub fn explain(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.separate();
            self.explanation.push_str(text);
        }
        self
    }

    /// Append a formatted fragment. A fragment that formats to nothing is ignored.
    pub fn explainf(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if let Some(text) = args.as_str() {
            return self.explain(text);
        }

        let mark = self.explanation.len();
        self.separate();
        let start = self.explanation.len();
        // A failing `Display` impl leaves no partial fragment behind
        if self.explanation.write_fmt(args).is_err() || self.explanation.len() == start {
            self.explanation.truncate(mark);
        }
        self
    }

    /// Owned form of [`Instance::explain`] for chaining.
    pub fn explained(mut self, text: &str) -> Self {
        self.explain(text);
        self
    }

    fn separate(&mut self) {
        if !self.explanation.is_empty() {
            self.explanation.push_str(EXPLANATION_SEPARATOR);
        }
    }

    // ------------------------------------------------------------------------
    // Path
    // ------------------------------------------------------------------------

    /// Attribute this occurrence to an input location.
    ///
    /// Each `{}` in `template` is replaced by the next argument. The
    /// stringified arguments stay readable through [`Instance::path_args`].
    ///
    /// ```rust
    /// use oops::Definition;
    ///
    /// let def = Definition::new().with_code("err_field");
    /// let mut err = def.emit("");
    /// err.set_path("items[{}].{}", &[&3, &"name"]);
    ///
    /// assert_eq!(err.path(), "items[3].name");
    /// assert_eq!(err.path_args(), ["3", "name"]);
    /// ```
    pub fn set_path(&mut self, template: &str, args: &[&dyn fmt::Display]) -> &mut Self {
        self.path.clear();
        self.path_args.clear();

        if args.is_empty() {
            self.path.push_str(template);
            return self;
        }

        let mut args = args.iter();
        let mut rest = template;
        while let Some(idx) = rest.find("{}") {
            self.path.push_str(&rest[..idx]);
            match args.next() {
                Some(arg) => {
                    let rendered = arg.to_string();
                    self.path.push_str(&rendered);
                    self.path_args.push(rendered);
                }
                None => self.path.push_str("{}"),
            }
            rest = &rest[idx + 2..];
        }
        self.path.push_str(rest);
        self.path_args.extend(args.map(|arg| arg.to_string()));
        self
    }

    /// Rendered path, empty when unset.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stringified path arguments.
    #[inline]
    pub fn path_args(&self) -> &[String] {
        &self.path_args
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// Set a property. An existing key is overwritten.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        put_property(&mut self.properties, key.into(), value.into());
        self
    }

    /// Read a property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// All properties, in no particular order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn property_slice(&self) -> &[(String, Value)] {
        &self.properties
    }

    // ------------------------------------------------------------------------
    // Causal and nested axes
    // ------------------------------------------------------------------------

    /// The error this occurrence wraps, if any.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Sibling occurrences aggregated under this one.
    #[inline]
    pub fn nested(&self) -> &[Instance] {
        &self.nested
    }

    /// Append nested occurrences. Does not touch the cause.
    pub fn append<I>(&mut self, members: I) -> &mut Self
    where
        I: IntoIterator<Item = Instance>,
    {
        self.nested.extend(members);
        self
    }

    /// Append one nested occurrence.
    pub fn push(&mut self, member: Instance) -> &mut Self {
        self.nested.push(member);
        self
    }

    pub(crate) fn take_nested(&mut self) -> Vec<Instance> {
        std::mem::take(&mut self.nested)
    }

    /// Whether this occurrence or anything on its causal chain comes from `target`.
    pub fn is(&self, target: &Definition) -> bool {
        crate::matching::is(self, target)
    }

    /// First occurrence of `target` on the causal chain, starting with `self`.
    pub fn find(&self, target: &Definition) -> Option<&Instance> {
        crate::matching::find(self, target)
    }

    /// Whether `target` occurs in this occurrence's nested tree.
    pub fn nested_is(&self, target: &Definition) -> bool {
        crate::matching::nested_is(self, target)
    }

    /// First occurrence of `target` in this occurrence's nested tree.
    pub fn nested_find(&self, target: &Definition) -> Option<&Instance> {
        crate::matching::nested_find(self, target)
    }

    /// First error of type `T` on the causal chain, excluding `self`.
    ///
    /// ```rust
    /// use oops::Definition;
    /// use std::io;
    ///
    /// let def = Definition::new().with_code("err_read");
    /// let err = def.wrap(io::Error::new(io::ErrorKind::NotFound, "gone"), "");
    ///
    /// let io_err = err.find_cause::<io::Error>().unwrap();
    /// assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    /// ```
    pub fn find_cause<T: Error + 'static>(&self) -> Option<&T> {
        let mut found = None;
        if let Some(cause) = &self.cause {
            crate::matching::walk(cause.as_error(), &mut |err| {
                found = err.downcast_ref::<T>();
                found.is_some()
            });
        }
        found
    }

    /// Whether a value equal to `needle` is on the causal chain.
    pub fn caused_by<T>(&self, needle: &T) -> bool
    where
        T: Error + PartialEq + 'static,
    {
        let mut hit = false;
        if let Some(cause) = &self.cause {
            crate::matching::walk(cause.as_error(), &mut |err| {
                hit = err.downcast_ref::<T>().is_some_and(|e| e == needle);
                hit
            });
        }
        hit
    }

    // ------------------------------------------------------------------------
    // Trace and rendering
    // ------------------------------------------------------------------------

    /// Frames captured at creation, empty when tracing is disabled.
    pub fn trace(&self) -> &[Frame] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Human-readable message.
    ///
    /// A custom formatter on the definition is used verbatim. Otherwise the
    /// result is `[type] code : explanation`, dropping the type part when the
    /// type is empty and the explanation part when nothing was explained.
    pub fn render(&self) -> String {
        if let Some(formatter) = self.source.formatter() {
            return formatter(self);
        }

        let (kind, code, explanation) = (self.kind(), self.code(), self.explanation());
        let mut out = String::with_capacity(kind.len() + code.len() + explanation.len() + 6);
        if !kind.is_empty() {
            out.push('[');
            out.push_str(kind);
            out.push_str("] ");
        }
        out.push_str(code);
        if !explanation.is_empty() {
            out.push_str(" : ");
            out.push_str(explanation);
        }
        out
    }

    /// Borrowed view of the internal diagnostic context.
    ///
    /// The view cannot outlive the instance.
    #[inline]
    pub fn diagnostic_log(&self) -> DiagnosticLog<'_> {
        DiagnosticLog::new(self)
    }

    /// Callback form of [`Instance::diagnostic_log`].
    #[inline]
    pub fn with_diagnostic_log<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&DiagnosticLog<'_>) -> R,
    {
        let log = self.diagnostic_log();
        f(&log)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("code", &self.code())
            .field("kind", &self.kind())
            .field("explanation", &self.explanation())
            .field("path", &self.path())
            .field("properties", &self.properties.len())
            .field("nested", &self.nested)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .field("trace", &self.trace().len())
            .finish()
    }
}

impl Error for Instance {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(Cause::as_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn def(code: &str) -> Definition {
        Definition::new().with_code(code)
    }

    #[test]
    fn explanation_accumulates() {
        let mut err = def("err_test").emit("foo");
        err.explain("baz");
        err.explainf(format_args!("id={}", 123));
        assert_eq!(err.explanation(), "foo, baz, id=123");
    }

    #[test]
    fn empty_explanations_are_ignored() {
        let mut err = def("err_test").emit("");
        assert_eq!(err.explanation(), "");

        err.explain("");
        err.explainf(format_args!("{}", ""));
        assert_eq!(err.explanation(), "");

        err.explain("first");
        err.explain("");
        err.explainf(format_args!("{}", ""));
        assert_eq!(err.explanation(), "first");
    }

    #[test]
    fn failing_display_leaves_explanation_intact() {
        struct HalfWritten;

        impl fmt::Display for HalfWritten {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("part")?;
                Err(fmt::Error)
            }
        }

        let mut err = def("err_test").emit("first");
        err.explainf(format_args!("{}", HalfWritten));
        assert_eq!(err.explanation(), "first");

        let mut empty = def("err_test").emit("");
        empty.explainf(format_args!("{}", HalfWritten));
        assert_eq!(empty.explanation(), "");
    }

    #[test]
    fn literal_explanations_are_not_interpolated() {
        let err = def("err_test").emit("100% {done}");
        assert_eq!(err.explanation(), "100% {done}");
    }

    #[test]
    fn emit_has_no_cause() {
        let d = def("err_emit");
        let err = d.emit("");
        assert!(err.cause().is_none());
        assert!(err.source().is_none());
        assert!(err.is(&d));
    }

    #[test]
    fn wrap_keeps_foreign_cause() {
        let err = def("err_wrap").wrap(io::Error::other("disk on fire"), "reading");
        let cause = err.cause().expect("wrapped");
        assert!(matches!(cause, Cause::Foreign(_)));
        assert_eq!(cause.to_string(), "disk on fire");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk on fire"));
    }

    #[test]
    fn wrap_keeps_instance_identity() {
        let inner = def("err_inner");
        let outer = def("err_outer");

        let err = outer.wrap(inner.emit("deep"), "");
        let cause = err.cause().and_then(Cause::as_instance).expect("instance cause");
        assert!(cause.same_classification(&inner.emit("")));
        assert_eq!(cause.explanation(), "deep");
    }

    #[test]
    fn caused_by_compares_values() {
        #[derive(Debug, PartialEq)]
        struct Code(u8);
        impl fmt::Display for Code {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "code {}", self.0)
            }
        }
        impl Error for Code {}

        let err = def("err_outer").wrap(def("err_inner").wrap(Code(7), ""), "");
        assert!(err.caused_by(&Code(7)));
        assert!(!err.caused_by(&Code(8)));
        assert_eq!(err.find_cause::<Code>(), Some(&Code(7)));
    }

    #[test]
    fn render_variants() {
        let bare = def("err_bare");
        assert_eq!(bare.emit("").render(), "err_bare");
        assert_eq!(bare.emit("why").render(), "err_bare : why");

        let typed = bare.with_type("db");
        assert_eq!(typed.emit("").render(), "[db] err_bare");
        assert_eq!(typed.emit("why").to_string(), "[db] err_bare : why");
    }

    #[test]
    fn custom_formatter_is_used_verbatim() {
        let d = def("err_fmt").with_formatter(|err| {
            let cause = err.cause().map(|c| c.to_string()).unwrap_or_default();
            format!("custom({}) <- {}", err.explanation(), cause)
        });
        let err = d.wrap(io::Error::other("eof"), "x");
        assert_eq!(err.render(), "custom(x) <- eof");
    }

    #[test]
    fn properties_last_write_wins() {
        let mut err = def("err_props").emit("");
        err.set_property("user", "ana").set_property("user", 42);
        assert_eq!(err.property("user"), Some(&Value::from(42)));
        assert_eq!(err.properties().count(), 1);
        assert!(err.property("missing").is_none());
    }

    #[test]
    fn instance_properties_override_defaults() {
        let d = def("err_props").with_property("retry", true);
        let mut err = d.emit("");
        err.set_property("retry", false);
        assert_eq!(err.property("retry"), Some(&Value::Bool(false)));
        assert_eq!(d.emit("").property("retry"), Some(&Value::Bool(true)));
    }

    #[test]
    fn path_without_args_is_literal() {
        let mut err = def("err_path").emit("");
        err.set_path("body.{}", &[]);
        assert_eq!(err.path(), "body.{}");
        assert!(err.path_args().is_empty());
    }

    #[test]
    fn path_reset_replaces_previous() {
        let mut err = def("err_path").emit("");
        err.set_path("a.{}", &[&1]);
        err.set_path("b", &[]);
        assert_eq!(err.path(), "b");
        assert!(err.path_args().is_empty());
    }

    #[test]
    fn nested_is_independent_of_cause() {
        let d = def("err_parent");
        let mut err = d.emit("");
        err.push(def("err_a").emit("")).append([def("err_b").emit("")]);
        assert_eq!(err.nested().len(), 2);
        assert!(err.cause().is_none());
    }

    #[test]
    fn multiple_display() {
        let m = Multiple::new(vec![def("a").emit(""), def("b").emit("")]);
        assert_eq!(m.to_string(), "multiple errors 2");
        assert_eq!(m.len(), 2);
        assert_eq!((&m).into_iter().count(), 2);
    }

    #[test]
    fn debug_shows_code() {
        let err = def("err_debug").emit("hello");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("err_debug"));
        assert!(dbg.contains("hello"));
    }
}
