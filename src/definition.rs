//! Immutable error templates.
//!
//! A [`Definition`] describes one class of failure: its classification, help
//! text, status code, trace policy and render policy. It is built once at
//! startup and then only ever read.
//!
//! Identity is the allocation. Two definitions built from identical fields are
//! still different classifications:
//!
//! ```rust
//! use oops::Definition;
//!
//! let a = Definition::new().with_code("err_dup").with_type("dup");
//! let b = Definition::new().with_code("err_dup").with_type("dup");
//!
//! assert_ne!(a, b);
//! assert!(!a.emit("").is(&b));
//! assert!(a.emit("").is(&a));
//! ```
//!
//! A definition is not an error. It implements neither `Display` nor
//! `std::error::Error`, so it can never be returned where a live error is
//! expected. Occurrences are created with [`Definition::emit`] and
//! [`Definition::wrap`].

use crate::aggregate::Collector;
use crate::instance::{Cause, Instance, Properties};
use crate::taxonomy::{Blame, Namespace, Reason, triple_code};
use crate::trace::capture_stack;
use serde_json::Value;
use smallvec::SmallVec;
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Custom render function attached to a definition.
///
/// Receives the full instance, including its cause, and its output is used
/// verbatim as the instance's display string.
pub type Formatter = Arc<dyn Fn(&Instance) -> String + Send + Sync>;

/// Frames between `capture_stack` and the caller of an emitting method:
/// `Definition::spawn` and the public entry point itself.
const SPAWN_SKIP: usize = 2;

/// How a definition classifies its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Closed `Blame.Namespace.Reason` triple.
    Triple {
        /// Who is to blame.
        blame: Blame,
        /// Where it happened.
        namespace: Namespace,
        /// Why it happened.
        reason: Reason,
    },
    /// Free-form code and type.
    Custom {
        /// Stable code.
        code: &'a str,
        /// Optional type, empty when unset.
        kind: &'a str,
    },
}

#[derive(Clone)]
struct Template {
    triple: Option<(Blame, Namespace, Reason)>,
    code: String,
    kind: String,
    help: String,
    status: Option<u16>,
    traced: bool,
    formatter: Option<Formatter>,
    properties: Properties,
}

impl Template {
    fn recode(&mut self, code: String) {
        if let Some((_, _, reason)) = self.triple.take() {
            self.status = self.status.or(Some(reason.status_code()));
        }
        self.code = code;
    }
}

/// Reusable, immutable error template.
///
/// Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct Definition(Arc<Template>);

impl Definition {
    /// Empty free-form definition. Add a code with [`Definition::with_code`].
    pub fn new() -> Self {
        Self(Arc::new(Template {
            triple: None,
            code: String::new(),
            kind: String::new(),
            help: String::new(),
            status: None,
            traced: false,
            formatter: None,
            properties: SmallVec::new(),
        }))
    }

    /// Definition classified by the closed taxonomy.
    ///
    /// The code is `BLAME.NAMESPACE.REASON`, computed once here, and the
    /// status defaults to the reason's mapped status.
    ///
    /// ```rust
    /// use oops::{Blame, Definition, Namespace, Reason};
    ///
    /// let def = Definition::classified(Blame::CLIENT, Namespace::API, Reason::AUTH_BAD);
    /// assert_eq!(def.code(), "CLIENT.API.AUTH_BAD");
    /// assert_eq!(def.status_code(), Some(401));
    /// ```
    pub fn classified(blame: Blame, namespace: Namespace, reason: Reason) -> Self {
        let mut template = Self::new().template();
        template.code = triple_code(blame, namespace, reason);
        template.triple = Some((blame, namespace, reason));
        Self(Arc::new(template))
    }

    fn template(&self) -> Template {
        (*self.0).clone()
    }

    fn derive(&self, edit: impl FnOnce(&mut Template)) -> Self {
        let mut template = self.template();
        edit(&mut template);
        Self(Arc::new(template))
    }

    // ------------------------------------------------------------------------
    // Builders: every call returns a new, distinct definition
    // ------------------------------------------------------------------------

    /// Copy with a free-form code.
    ///
    /// A taxonomy triple is dropped, but the status it mapped to is kept as an
    /// explicit status.
    pub fn with_code(&self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.derive(|t| t.recode(code))
    }

    /// Copy with a type label, rendered as `[type] code`.
    pub fn with_type(&self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        self.derive(|t| t.kind = kind)
    }

    /// Copy with client-facing help text.
    pub fn with_help(&self, help: impl Into<String>) -> Self {
        let help = help.into();
        self.derive(|t| t.help = help)
    }

    /// Copy with an explicit status code overriding the reason mapping.
    pub fn with_status(&self, status: u16) -> Self {
        self.derive(|t| t.status = Some(status))
    }

    /// Copy that captures a call stack for every instance it creates.
    pub fn with_trace(&self) -> Self {
        self.derive(|t| t.traced = true)
    }

    /// Copy with a custom render function.
    pub fn with_formatter<F>(&self, formatter: F) -> Self
    where
        F: Fn(&Instance) -> String + Send + Sync + 'static,
    {
        let formatter: Formatter = Arc::new(formatter);
        self.derive(|t| t.formatter = Some(formatter))
    }

    /// Copy with a default property copied into every new instance.
    ///
    /// Setting an existing key replaces its value.
    pub fn with_property(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.derive(|t| crate::instance::put_property(&mut t.properties, key, value))
    }

    /// Start a family of sibling definitions sharing this one's fields.
    pub fn group(&self) -> Group {
        Group {
            base: self.clone(),
            prefix: String::new(),
            kind: None,
        }
    }

    // ------------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------------

    /// Stable code. For taxonomy definitions this is `BLAME.NAMESPACE.REASON`.
    #[inline]
    pub fn code(&self) -> &str {
        &self.0.code
    }

    /// Type label, empty when unset.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    /// Help text, empty when unset.
    #[inline]
    pub fn help(&self) -> &str {
        &self.0.help
    }

    /// Whether instances capture a call stack.
    #[inline]
    pub fn is_traced(&self) -> bool {
        self.0.traced
    }

    /// Classification used for display and status mapping.
    pub fn classification(&self) -> Classification<'_> {
        match self.0.triple {
            Some((blame, namespace, reason)) => Classification::Triple {
                blame,
                namespace,
                reason,
            },
            None => Classification::Custom {
                code: &self.0.code,
                kind: &self.0.kind,
            },
        }
    }

    /// Explicit override, else the reason's mapped status, else `None`.
    pub fn status_code(&self) -> Option<u16> {
        self.0
            .status
            .or_else(|| self.0.triple.map(|(_, _, reason)| reason.status_code()))
    }

    pub(crate) fn formatter(&self) -> Option<&Formatter> {
        self.0.formatter.as_ref()
    }

    pub(crate) fn default_properties(&self) -> &Properties {
        &self.0.properties
    }

    // ------------------------------------------------------------------------
    // Occurrences
    // ------------------------------------------------------------------------

    /// `above` counts crate frames between the caller of `spawn` and the
    /// user's code.
    #[inline(never)]
    pub(crate) fn spawn(&self, cause: Option<Cause>, above: usize) -> Instance {
        let trace = if self.0.traced {
            Some(capture_stack(SPAWN_SKIP + above))
        } else {
            None
        };
        Instance::from_parts(self.clone(), cause, trace)
    }

    /// New occurrence without a cause.
    ///
    /// `explanation` is taken literally; an empty string adds nothing.
    #[inline(never)]
    pub fn emit(&self, explanation: &str) -> Instance {
        let mut err = self.spawn(None, 0);
        err.explain(explanation);
        err
    }

    /// New occurrence without a cause and a formatted explanation.
    #[inline(never)]
    pub fn emitf(&self, explanation: fmt::Arguments<'_>) -> Instance {
        let mut err = self.spawn(None, 0);
        err.explainf(explanation);
        err
    }

    /// New occurrence caused by `cause`.
    ///
    /// Instances keep their full identity as cause, anything else is kept as a
    /// foreign cause. The cause is always reachable through
    /// [`Instance::cause`] and `Error::source`.
    #[inline(never)]
    pub fn wrap<E>(&self, cause: E, explanation: &str) -> Instance
    where
        E: Error + Send + Sync + 'static,
    {
        let mut err = self.spawn(Some(Cause::from_error(cause)), 0);
        err.explain(explanation);
        err
    }

    /// Like [`Definition::wrap`] with a formatted explanation.
    #[inline(never)]
    pub fn wrapf<E>(&self, cause: E, explanation: fmt::Arguments<'_>) -> Instance
    where
        E: Error + Send + Sync + 'static,
    {
        let mut err = self.spawn(Some(Cause::from_error(cause)), 0);
        err.explainf(explanation);
        err
    }

    /// Like [`Definition::wrap`] for an already boxed error.
    #[inline(never)]
    pub fn wrap_boxed(&self, cause: Box<dyn Error + Send + Sync>, explanation: &str) -> Instance {
        let mut err = self.spawn(Some(Cause::from_boxed(cause)), 0);
        err.explain(explanation);
        err
    }

    /// Emit one occurrence holding `members` as nested errors.
    ///
    /// Returns `None` when `members` is empty.
    #[inline(never)]
    pub fn nest<I>(&self, members: I) -> Option<Instance>
    where
        I: IntoIterator<Item = Instance>,
    {
        let members: Vec<Instance> = members.into_iter().collect();
        if members.is_empty() {
            return None;
        }
        let mut err = self.spawn(None, 0);
        err.append(members);
        Some(err)
    }

    /// Start collecting independent failures under this classification.
    pub fn collect(&self) -> Collector {
        Collector::new(self.clone())
    }

    /// Whether `err` itself is an occurrence of this definition.
    ///
    /// Only the value is inspected, never its causes. Use
    /// [`is`](crate::matching::is) to search a causal chain.
    pub fn matches(&self, err: &(dyn Error + 'static)) -> bool {
        err.downcast_ref::<Instance>()
            .is_some_and(|instance| instance.definition() == self)
    }
}

impl Default for Definition {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Definition {}

impl Hash for Definition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("code", &self.0.code)
            .field("kind", &self.0.kind)
            .field("status", &self.status_code())
            .field("traced", &self.0.traced)
            .field("formatter", &self.0.formatter.as_ref().map(|_| "<CUSTOM>"))
            .finish()
    }
}

// ============================================================================
// Groups
// ============================================================================

/// Factory for sibling definitions derived from one base.
///
/// Every sibling copies the base's help, status, trace flag, formatter and
/// default properties, and gets its own code.
///
/// ```rust
/// use oops::Definition;
///
/// let base = Definition::new().with_type("auth").with_status(401);
/// let auth = base.group().with_code_prefix("auth_");
///
/// let expired = auth.code("expired");
/// let revoked = auth.code("revoked");
///
/// assert_eq!(expired.code(), "auth_expired");
/// assert_eq!(revoked.status_code(), Some(401));
/// assert_ne!(expired, revoked);
/// ```
#[derive(Debug, Clone)]
pub struct Group {
    base: Definition,
    prefix: String,
    kind: Option<String>,
}

impl Group {
    /// Prefix every generated code.
    pub fn with_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Override the type of every generated definition.
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// New sibling definition with code `prefix + suffix`.
    pub fn code(&self, suffix: &str) -> Definition {
        let mut code = String::with_capacity(self.prefix.len() + suffix.len());
        code.push_str(&self.prefix);
        code.push_str(suffix);

        self.base.derive(|t| {
            t.recode(code);
            if let Some(kind) = &self.kind {
                t.kind.clone_from(kind);
            }
        })
    }
}
