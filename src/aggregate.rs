//! Joining independent failures into one value.
//!
//! - [`multi`] joins whatever errors a caller already holds.
//! - [`Collector`] accumulates failures one by one (typically per input field)
//!   under a single parent classification.

use crate::definition::Definition;
use crate::instance::{Cause, Instance, Multiple};
use crate::presets;
use std::error::Error;
use std::fmt;

/// Join several optional errors.
///
/// - no present errors: `None`
/// - exactly one: that error, untouched
/// - more: a [`presets::MULTIPLE`] instance whose cause is a [`Multiple`]
///   holding the members and whose nested list holds the same members
///
/// Members that are themselves `MULTIPLE` aggregates are flattened.
///
/// ```rust
/// use oops::{aggregate::multi, presets, Definition, Instance};
///
/// let def = Definition::new().with_code("err_part");
///
/// assert!(multi(Vec::<Option<Instance>>::new()).is_none());
///
/// let single = multi([None, Some(def.emit("only"))]).unwrap();
/// assert!(single.is(&def));
///
/// let joined = multi([def.emit("a"), def.emit("b"), def.emit("c")]).unwrap();
/// assert!(joined.definition() == &*presets::MULTIPLE);
/// assert_eq!(joined.nested().len(), 3);
/// ```
pub fn multi<I>(errors: I) -> Option<Instance>
where
    I: IntoIterator,
    I::Item: Into<Option<Instance>>,
{
    let mut present: Vec<Instance> = errors.into_iter().filter_map(Into::into).collect();

    match present.len() {
        0 => return None,
        1 => return present.pop(),
        _ => {}
    }

    let mut members = Vec::with_capacity(present.len());
    for mut err in present {
        if err.definition() == &*presets::MULTIPLE {
            members.extend(err.take_nested());
        } else {
            members.push(err);
        }
    }

    let cause = Cause::Multiple(Multiple::new(members.clone()));
    let mut joined = presets::MULTIPLE.spawn(Some(cause), 0);
    joined.append(members);
    Some(joined)
}

// ============================================================================
// Collector
// ============================================================================

/// Stateful builder gathering failures under one parent definition.
///
/// Inputs that are not already instances are wrapped with a fallback
/// definition ([`presets::UNEXPECTED`] unless changed).
///
/// ```rust
/// use oops::Definition;
///
/// let form = Definition::new().with_code("err_form");
/// let required = Definition::new().with_code("err_required");
///
/// let mut collector = form.collect();
/// let age: Option<u8> = collector.check("x".parse::<u8>(), "age");
/// collector.add_opt(None::<oops::Instance>, "ignored");
/// collector.add_with(required.emit(""), "items[{}].name", &[&2]);
///
/// assert!(age.is_none());
/// let err = collector.finish().unwrap();
/// assert_eq!(err.nested().len(), 2);
/// assert_eq!(err.nested()[0].path(), "age");
/// assert_eq!(err.nested()[1].path(), "items[2].name");
/// ```
#[must_use = "a collector does nothing until finished"]
pub struct Collector {
    definition: Definition,
    fallback: Definition,
    pending: Vec<Instance>,
}

impl Collector {
    pub(crate) fn new(definition: Definition) -> Self {
        Self {
            definition,
            fallback: presets::UNEXPECTED.clone(),
            pending: Vec::with_capacity(4),
        }
    }

    /// Use `fallback` to wrap inputs that are not instances.
    pub fn with_fallback(mut self, fallback: &Definition) -> Self {
        self.fallback = fallback.clone();
        self
    }

    /// Add a failure attributed to a literal `path`.
    #[inline(never)]
    pub fn add<E>(&mut self, err: E, path: &str) -> &mut Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.push(err, path, &[])
    }

    /// Add a failure attributed to a templated path (see [`Instance::set_path`]).
    #[inline(never)]
    pub fn add_with<E>(&mut self, err: E, template: &str, args: &[&dyn fmt::Display]) -> &mut Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.push(err, template, args)
    }

    /// Add a failure if present. `None` is ignored.
    #[inline(never)]
    pub fn add_opt<E>(&mut self, err: Option<E>, path: &str) -> &mut Self
    where
        E: Error + Send + Sync + 'static,
    {
        if let Some(err) = err {
            self.push(err, path, &[]);
        }
        self
    }

    /// Unpack a result, collecting its error.
    #[inline(never)]
    pub fn check<T, E>(&mut self, result: Result<T, E>, path: &str) -> Option<T>
    where
        E: Error + Send + Sync + 'static,
    {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err, path, &[]);
                None
            }
        }
    }

    // Frames above `coerce_with`: this one and the public method.
    #[inline(never)]
    fn push<E>(&mut self, err: E, template: &str, args: &[&dyn fmt::Display]) -> &mut Self
    where
        E: Error + Send + Sync + 'static,
    {
        let mut instance = coerce_with(err, &self.fallback, 2);
        instance.set_path(template, args);
        self.pending.push(instance);
        self
    }

    /// Number of collected failures.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing was collected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// `None` if nothing was collected, otherwise a new instance of the
    /// collector's definition holding every failure as nested members.
    #[inline(never)]
    pub fn finish(self) -> Option<Instance> {
        if self.pending.is_empty() {
            return None;
        }
        let mut err = self.definition.spawn(None, 0);
        err.append(self.pending);
        Some(err)
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("definition", &self.definition.code())
            .field("fallback", &self.fallback.code())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Turn any error into an instance, wrapping non-instances with `fallback`.
///
/// `above` counts crate frames between this call and the user's code, so a
/// captured trace starts at the user's call site.
#[inline(never)]
pub(crate) fn coerce_with<E>(err: E, fallback: &Definition, above: usize) -> Instance
where
    E: Error + Send + Sync + 'static,
{
    let boxed: Box<dyn Error + Send + Sync> = Box::new(err);
    match boxed.downcast::<Instance>() {
        Ok(instance) => *instance,
        Err(other) => fallback.spawn(Some(Cause::from_boxed(other)), above),
    }
}
