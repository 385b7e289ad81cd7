//! Call-stack snapshots for traced definitions.
//!
//! Capturing is the only expensive operation in this crate, so it runs only
//! for definitions built with [`Definition::with_trace`](crate::Definition::with_trace),
//! exactly once per instance, at creation.
//!
//! Without the `trace` feature [`capture_stack`] always returns an empty trace.

use std::fmt;
use std::sync::Arc;

/// Placeholder used for any frame detail the runtime could not resolve.
pub const UNKNOWN_SYMBOL: &str = "???";

/// One resolved call frame, outermost caller last.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    file: Option<String>,
    line: u32,
    address: usize,
    function: String,
}

impl Frame {
    /// Build a frame from already resolved parts.
    pub fn new(file: Option<String>, line: u32, address: usize, function: impl Into<String>) -> Self {
        Self {
            file,
            line,
            address,
            function: function.into(),
        }
    }

    /// Source file, when debug info is available.
    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Source line, `0` when unknown.
    #[inline]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Instruction address of the frame.
    #[inline]
    pub const fn address(&self) -> usize {
        self.address
    }

    /// Normalized function name (see [`function_name`]).
    #[inline]
    pub fn function(&self) -> &str {
        &self.function
    }
}

impl fmt::Display for Frame {
    /// `<file>:<line> (<address>): <function>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (0x{:x}): {}",
            self.file.as_deref().unwrap_or(UNKNOWN_SYMBOL),
            self.line,
            self.address,
            self.function
        )
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Frozen, cheaply clonable frame sequence.
pub type Trace = Arc<[Frame]>;

/// Reduce a demangled Rust symbol to a crate-free dotted form.
///
/// - `<Type as Trait>::method` and `<Type>::method` keep only the self type
/// - everything up to and including the last `/` is dropped
/// - the first path segment (the crate) is dropped
/// - `::` and `·` become `.`
///
/// ```rust
/// use oops::trace::function_name;
///
/// assert_eq!(function_name("oops::definition::Definition::emit"), "definition.Definition.emit");
/// assert_eq!(function_name("<app::Store as core::ops::Drop>::drop"), "Store.drop");
/// ```
pub fn function_name(raw: &str) -> String {
    if raw.is_empty() {
        return UNKNOWN_SYMBOL.to_string();
    }

    let owned;
    let mut name = raw;

    if let Some(rest) = name.strip_prefix('<') {
        if let Some(close) = matching_angle(rest) {
            let inner = &rest[..close];
            let self_ty = inner.split(" as ").next().unwrap_or(inner);
            owned = format!("{}{}", self_ty, &rest[close + 1..]);
            name = &owned;
        }
    }

    if let Some(slash) = name.rfind('/') {
        name = &name[slash + 1..];
    }
    if let Some(sep) = name.find("::") {
        name = &name[sep + 2..];
    }

    name.replace("::", ".").replace('·', ".")
}

/// Index of the `>` closing a `<` that was already consumed.
fn matching_angle(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if depth == 0 => return Some(idx),
            '>' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Snapshot the current call stack.
///
/// Frames start at the caller of `capture_stack` and `skip` further frames
/// are dropped from the top. The walk ends when the unwinder reports no
/// more callers.
#[inline(never)]
pub fn capture_stack(skip: usize) -> Trace {
    #[cfg(feature = "trace")]
    {
        walk(skip).into()
    }

    #[cfg(not(feature = "trace"))]
    {
        let _ = skip;
        Arc::from(Vec::new())
    }
}

#[cfg(feature = "trace")]
fn walk(skip: usize) -> Vec<Frame> {
    let mut raw: Vec<(Frame, bool)> = Vec::with_capacity(16);

    backtrace::trace(|frame| {
        let address = frame.ip() as usize;
        let mut resolved = false;

        backtrace::resolve_frame(frame, |symbol| {
            resolved = true;
            let demangled = symbol.name().map(|n| format!("{:#}", n)).unwrap_or_default();
            let anchor = demangled.ends_with("capture_stack");
            raw.push((
                Frame {
                    file: symbol.filename().map(|p| p.display().to_string()),
                    line: symbol.lineno().unwrap_or(0),
                    address,
                    function: function_name(&demangled),
                },
                anchor,
            ));
        });

        if !resolved {
            raw.push((Frame::new(None, 0, address, UNKNOWN_SYMBOL), false));
        }
        true
    });

    let start = raw
        .iter()
        .position(|(_, anchor)| *anchor)
        .map_or(0, |idx| idx + 1);

    raw.into_iter()
        .skip(start.saturating_add(skip))
        .map(|(frame, _)| frame)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_name_strips_crate_and_paths() {
        assert_eq!(function_name("oops::trace::capture_stack"), "trace.capture_stack");
        assert_eq!(function_name("main"), "main");
        assert_eq!(function_name("github.com/acme/pkg/oops.Stack"), "oops.Stack");
        assert_eq!(function_name("svc::run·fm"), "run.fm");
    }

    #[test]
    fn function_name_keeps_self_type_of_trait_impls() {
        assert_eq!(
            function_name("<oops::instance::Instance as core::fmt::Display>::fmt"),
            "instance.Instance.fmt"
        );
        assert_eq!(
            function_name("<alloc::vec::Vec<u8> as core::clone::Clone>::clone"),
            "vec.Vec<u8>.clone"
        );
        assert_eq!(function_name("<app::Thing>::new"), "Thing.new");
    }

    #[test]
    fn function_name_unknown() {
        assert_eq!(function_name(""), "???");
    }

    #[test]
    fn frame_display_format() {
        let frame = Frame::new(Some("src/lib.rs".into()), 42, 0xbeef, "lib.run");
        assert_eq!(frame.to_string(), "src/lib.rs:42 (0xbeef): lib.run");

        let unknown = Frame::new(None, 0, 0x10, UNKNOWN_SYMBOL);
        assert_eq!(unknown.to_string(), "???:0 (0x10): ???");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn capture_excludes_itself() {
        let trace = capture_stack(0);
        assert!(!trace.is_empty());
        assert!(trace.iter().all(|f| !f.function().ends_with("capture_stack")));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn skip_drops_frames_from_the_top() {
        let full = capture_stack(0);
        let skipped = capture_stack(1);
        assert!(skipped.len() < full.len());
    }

    #[cfg(not(feature = "trace"))]
    #[test]
    fn capture_is_empty_without_feature() {
        assert!(capture_stack(0).is_empty());
    }
}
