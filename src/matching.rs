//! Identity-based matching along two independent axes.
//!
//! - **Causal** ([`is`], [`find`]): walk `Error::source` upward. Foreign
//!   errors are stepped through, an aggregate cause fans out to every member.
//!   Nested lists are never inspected.
//! - **Nested** ([`nested_is`], [`nested_find`]): resolve the first
//!   [`Instance`] on the causal chain, then search it and its nested tree only.
//!   Causes of nested members are never followed.
//!
//! ```rust
//! use oops::{matching, Definition};
//!
//! let form = Definition::new().with_code("err_form");
//! let field = Definition::new().with_code("err_field");
//!
//! let mut collector = form.collect();
//! collector.add(field.emit("too short"), "name");
//! let err = collector.finish().unwrap();
//!
//! assert!(matching::nested_is(&err, &field));
//! assert!(!matching::is(&err, &field));
//! ```

use crate::definition::Definition;
use crate::instance::{Instance, Multiple};
use std::error::Error;

/// Anything that can be viewed as a `'static` error trait object.
///
/// Lets the matching functions accept concrete errors and trait objects alike.
pub trait AsError {
    /// View as a plain error.
    fn as_error(&self) -> &(dyn Error + 'static);
}

impl<T: Error + 'static> AsError for T {
    #[inline]
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsError for dyn Error + 'static {
    #[inline]
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsError for dyn Error + Send + 'static {
    #[inline]
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsError for dyn Error + Send + Sync + 'static {
    #[inline]
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

/// Visit `err` and every error causally behind it until `visit` returns `true`.
///
/// Aggregates are expanded depth-first, member by member.
pub(crate) fn walk<'a>(
    err: &'a (dyn Error + 'static),
    visit: &mut dyn FnMut(&'a (dyn Error + 'static)) -> bool,
) -> bool {
    if visit(err) {
        return true;
    }

    if let Some(multiple) = err.downcast_ref::<Multiple>() {
        return multiple.iter().any(|member| walk(member, visit));
    }

    match err.source() {
        Some(next) => walk(next, visit),
        None => false,
    }
}

/// First occurrence of `target` on the causal chain of `err`, `err` included.
pub fn find<'a, E>(err: &'a E, target: &Definition) -> Option<&'a Instance>
where
    E: AsError + ?Sized,
{
    let mut found = None;
    walk(err.as_error(), &mut |current| {
        found = current
            .downcast_ref::<Instance>()
            .filter(|instance| instance.definition() == target);
        found.is_some()
    });
    found
}

/// Whether `target` occurs on the causal chain of `err`.
pub fn is<E>(err: &E, target: &Definition) -> bool
where
    E: AsError + ?Sized,
{
    find(err, target).is_some()
}

/// [`is`] over possibly absent values.
///
/// Absence matches only absence: `(None, None)` is `true`, a live error never
/// matches a missing definition, and a missing error never matches anything.
///
/// ```rust
/// use oops::{matching, Definition, Instance};
///
/// let def = Definition::new().with_code("err_x");
/// let err = def.emit("");
///
/// assert!(matching::is_option(None::<&Instance>, None));
/// assert!(!matching::is_option(Some(&err), None));
/// assert!(!matching::is_option(None::<&Instance>, Some(&def)));
/// assert!(matching::is_option(Some(&err), Some(&def)));
/// ```
pub fn is_option<E>(err: Option<&E>, target: Option<&Definition>) -> bool
where
    E: AsError + ?Sized,
{
    match (err, target) {
        (None, None) => true,
        (Some(err), Some(target)) => is(err, target),
        _ => false,
    }
}

/// First [`Instance`] on the causal chain of `err`, `err` included.
pub fn first_instance<E>(err: &E) -> Option<&Instance>
where
    E: AsError + ?Sized,
{
    let mut found = None;
    walk(err.as_error(), &mut |current| {
        found = current.downcast_ref::<Instance>();
        found.is_some()
    });
    found
}

/// First occurrence of `target` in the nested tree of the first instance
/// found on the causal chain of `err`.
pub fn nested_find<'a, E>(err: &'a E, target: &Definition) -> Option<&'a Instance>
where
    E: AsError + ?Sized,
{
    first_instance(err).and_then(|instance| search_nested(instance, target))
}

/// Whether `target` occurs in the nested tree of `err`.
pub fn nested_is<E>(err: &E, target: &Definition) -> bool
where
    E: AsError + ?Sized,
{
    nested_find(err, target).is_some()
}

fn search_nested<'a>(instance: &'a Instance, target: &Definition) -> Option<&'a Instance> {
    if instance.definition() == target {
        return Some(instance);
    }
    instance
        .nested()
        .iter()
        .find_map(|member| search_nested(member, target))
}
