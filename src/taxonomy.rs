//! Closed classification vocabulary: who is to blame, where it happened, and why.
//!
//! # Taxonomy
//!
//! A classified failure is the triple `Blame.Namespace.Reason`, rendered as
//! upper snake case labels joined by dots (e.g. `CLIENT.API.VALIDATION`).
//!
//! Each axis is a `u8` newtype with associated constants instead of a Rust
//! `enum`. Values decoded from the outside (wire formats, databases, older
//! binaries) can therefore carry numbers this build does not know about, and
//! such values stay *loud*:
//!
//! - `render()` returns `"UNDEFINED"` (never an empty string)
//! - `Reason::status_code()` returns `418` (teapot), which no mapped reason uses
//!
//! # Example
//!
//! ```rust
//! use oops::{Blame, Namespace, Reason};
//!
//! assert_eq!(Blame::CLIENT.render(), "CLIENT");
//! assert_eq!(Namespace::API.render(), "API");
//! assert_eq!(Reason::VALIDATION.status_code(), 400);
//!
//! // Unknown raw values are never silent
//! assert_eq!(Reason::from_raw(250).render(), "UNDEFINED");
//! assert_eq!(Reason::from_raw(250).status_code(), 418);
//! ```

use std::fmt;

/// Label returned for any value outside the closed set.
pub const UNDEFINED_LABEL: &str = "UNDEFINED";

/// Status returned for any reason outside the closed set.
///
/// No known reason maps to it, so seeing it in a response means a mapping bug.
pub const UNMAPPED_STATUS: u16 = 418;

// ============================================================================
// Blame
// ============================================================================

/// Who is responsible for the failure.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Blame(u8);

impl Blame {
    /// Responsibility could not be determined.
    pub const UNKNOWN: Blame = Blame(0);
    /// The caller sent something wrong.
    pub const CLIENT: Blame = Blame(1);
    /// The server failed on its own.
    pub const SERVER: Blame = Blame(2);
    /// A code path that should never have been reached.
    pub const DEVELOPER: Blame = Blame(3);
    /// An external dependency failed.
    pub const THIRD_PARTY: Blame = Blame(4);

    /// Every known value, in declaration order.
    pub const ALL: [Blame; 5] = [
        Self::UNKNOWN,
        Self::CLIENT,
        Self::SERVER,
        Self::DEVELOPER,
        Self::THIRD_PARTY,
    ];

    /// Wrap a raw value without validation.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Stable upper snake case label, `"UNDEFINED"` for unknown values.
    pub const fn render(self) -> &'static str {
        match self.0 {
            0 => "UNKNOWN",
            1 => "CLIENT",
            2 => "SERVER",
            3 => "DEVELOPER",
            4 => "THIRD_PARTY",
            _ => UNDEFINED_LABEL,
        }
    }

    /// Whether the value belongs to the closed set.
    #[inline]
    pub const fn is_known(self) -> bool {
        (self.0 as usize) < Self::ALL.len()
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// The layer in which the failure originated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(u8);

impl Namespace {
    /// Origin could not be determined.
    pub const UNKNOWN: Namespace = Namespace(0);
    /// Static initialisation only.
    pub const INIT: Namespace = Namespace(1);
    /// Anything before the main loop starts.
    pub const SETUP: Namespace = Namespace(2);
    /// Generic free functions.
    pub const RUNTIME: Namespace = Namespace(3);
    /// Third party integrations.
    pub const INTEGRATION: Namespace = Namespace(4);
    /// Inbound API layer (routers, handlers).
    pub const API: Namespace = Namespace(5);
    /// Any other ingress that is not an API.
    pub const INGRESS: Namespace = Namespace(6);
    /// Core service logic.
    pub const SERVICE: Namespace = Namespace(7);
    /// Temporary storage clients.
    pub const CACHE: Namespace = Namespace(8);
    /// Persistent storage clients.
    pub const STORE: Namespace = Namespace(9);
    /// Tests, examples and benchmarks.
    pub const TEST: Namespace = Namespace(10);

    /// Every known value, in declaration order.
    pub const ALL: [Namespace; 11] = [
        Self::UNKNOWN,
        Self::INIT,
        Self::SETUP,
        Self::RUNTIME,
        Self::INTEGRATION,
        Self::API,
        Self::INGRESS,
        Self::SERVICE,
        Self::CACHE,
        Self::STORE,
        Self::TEST,
    ];

    /// Wrap a raw value without validation.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Stable upper snake case label, `"UNDEFINED"` for unknown values.
    pub const fn render(self) -> &'static str {
        match self.0 {
            0 => "UNKNOWN",
            1 => "INIT",
            2 => "SETUP",
            3 => "RUNTIME",
            4 => "INTEGRATION",
            5 => "API",
            6 => "INGRESS",
            7 => "SERVICE",
            8 => "CACHE",
            9 => "STORE",
            10 => "TEST",
            _ => UNDEFINED_LABEL,
        }
    }

    /// Whether the value belongs to the closed set.
    #[inline]
    pub const fn is_known(self) -> bool {
        (self.0 as usize) < Self::ALL.len()
    }
}

// ============================================================================
// Reason
// ============================================================================

/// Concrete failure cause, each mapped to exactly one HTTP status.
///
/// "Resource" reasons describe data returned by the server to its client,
/// "payload" reasons describe data the server sends to another service, and
/// "request" reasons describe what the client sent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reason(u8);

macro_rules! reasons {
    ($( $(#[$meta:meta])* $name:ident = ($raw:literal, $label:literal, $status:literal), )+) => {
        impl Reason {
            $(
                $(#[$meta])*
                pub const $name: Reason = Reason($raw);
            )+

            /// Every known value, in declaration order.
            pub const ALL: &'static [Reason] = &[$(Self::$name),+];

            /// Stable upper snake case label, `"UNDEFINED"` for unknown values.
            pub const fn render(self) -> &'static str {
                match self.0 {
                    $($raw => $label,)+
                    _ => UNDEFINED_LABEL,
                }
            }

            /// Mapped HTTP status, `418` for unknown values.
            pub const fn status_code(self) -> u16 {
                match self.0 {
                    $($raw => $status,)+
                    _ => UNMAPPED_STATUS,
                }
            }

            /// Inverse of [`Reason::render`] for known labels.
            pub fn from_label(label: &str) -> Option<Reason> {
                match label {
                    $($label => Some(Self::$name),)+
                    _ => None,
                }
            }
        }
    };
}

reasons! {
    /// Must not be used in code; flags badly decoded values.
    UNKNOWN = (0, "UNKNOWN", 500),
    /// Failure from an unknown point (e.g. a panic).
    UNEXPECTED = (1, "UNEXPECTED", 500),
    /// Unexpected failure from a known point.
    INTERNAL = (2, "INTERNAL", 500),
    /// Server unhealthy, degradation in effect.
    UNAVAILABLE = (3, "UNAVAILABLE", 503),
    /// Any failed connection (TCP, database, cache, internet).
    CONNECTION = (4, "CONNECTION", 500),
    /// Connection or deadline timeout.
    TIMEOUT = (5, "TIMEOUT", 504),
    /// Reader or writer failure.
    IO = (6, "IO", 500),
    /// Operating system or file system call.
    OS = (7, "OS", 500),
    /// Input validation rules failed.
    VALIDATION = (8, "VALIDATION", 400),
    /// Input is well formed but does not resolve to anything known.
    VALIDATION_LOOKUP = (9, "VALIDATION_LOOKUP", 400),
    /// Database failure not covered below.
    DB_GENERIC = (10, "DB_GENERIC", 500),
    /// Query failed.
    DB_QUERY = (11, "DB_QUERY", 500),
    /// Exec failed.
    DB_EXEC = (12, "DB_EXEC", 500),
    /// Row scan failed.
    DB_SCAN = (13, "DB_SCAN", 500),
    /// Transaction could not be opened.
    DB_TX = (14, "DB_TX", 500),
    /// Transaction commit failed.
    DB_TX_COMMIT = (15, "DB_TX_COMMIT", 500),
    /// Transaction rollback failed.
    DB_TX_ROLLBACK = (16, "DB_TX_ROLLBACK", 500),
    /// No credentials supplied.
    AUTH_NONE = (17, "AUTH_NONE", 401),
    /// Credentials malformed.
    AUTH_FORMAT = (18, "AUTH_FORMAT", 401),
    /// Credentials not valid.
    AUTH_BAD = (19, "AUTH_BAD", 401),
    /// Credentials valid but not allowed.
    AUTH_FORBIDDEN = (20, "AUTH_FORBIDDEN", 403),
    /// Request rate limited, retry later.
    RATE_LIMIT = (21, "RATE_LIMIT", 429),
    /// Client banned from further requests.
    RATE_LIMIT_BAN = (22, "RATE_LIMIT_BAN", 429),
    /// Rejected on legal grounds.
    LEGAL = (23, "LEGAL", 451),
    /// Encoding a resource failed.
    RESOURCE_ENCODING = (24, "RESOURCE_ENCODING", 500),
    /// Decoding a resource failed.
    RESOURCE_DECODING = (25, "RESOURCE_DECODING", 500),
    /// Resource does not exist.
    RESOURCE_NOT_FOUND = (26, "RESOURCE_NOT_FOUND", 404),
    /// Resource existed once, or has expired.
    RESOURCE_GONE = (27, "RESOURCE_GONE", 410),
    /// Resource may exist later.
    RESOURCE_NOT_YET = (28, "RESOURCE_NOT_YET", 425),
    /// Resource too large to process.
    RESOURCE_TOO_LARGE = (29, "RESOURCE_TOO_LARGE", 413),
    /// Encoding an outbound payload failed.
    PAYLOAD_ENCODING = (30, "PAYLOAD_ENCODING", 500),
    /// Decoding an inbound payload failed.
    PAYLOAD_DECODING = (31, "PAYLOAD_DECODING", 500),
    /// Payload too large to process.
    PAYLOAD_TOO_LARGE = (32, "PAYLOAD_TOO_LARGE", 500),
    /// Request not in the expected format or encoding.
    REQUEST_FORMAT = (33, "REQUEST_FORMAT", 415),
    /// Request body could not be decoded.
    REQUEST_DECODING = (34, "REQUEST_DECODING", 400),
    /// Request too large, will not be processed.
    REQUEST_TOO_LARGE = (35, "REQUEST_TOO_LARGE", 413),
    /// Request information missing.
    REQUEST_MISSING = (36, "REQUEST_MISSING", 421),
    /// Generic bad request, prefer something more specific.
    REQUEST_BAD = (37, "REQUEST_BAD", 400),
    /// Request understood but conflicts with current state.
    REQUEST_CONFLICT = (38, "REQUEST_CONFLICT", 409),
    /// Request well formed but instructions not understood.
    REQUEST_UNPROCESSABLE = (39, "REQUEST_UNPROCESSABLE", 422),
    /// Request parameters failed manual validation.
    REQUEST_VALIDATION_PARAMETERS = (40, "REQUEST_VALIDATION_PARAMETERS", 400),
    /// Method not allowed on this endpoint.
    REQUEST_METHOD_NOT_ALLOWED = (41, "REQUEST_METHOD_NOT_ALLOWED", 405),
    /// No endpoint at this path.
    REQUEST_ENDPOINT_NOT_FOUND = (42, "REQUEST_ENDPOINT_NOT_FOUND", 404),
    /// Idempotency key reuse or race.
    IDEMPOTENCY = (43, "IDEMPOTENCY", 423),
    /// Configuration or state does not match the requested action.
    CONFIG = (44, "CONFIG", 409),
    /// Configuration or expected state absent.
    CONFIG_MISSING = (45, "CONFIG_MISSING", 400),
    /// Bad key, size, nonce and similar.
    CRYPTO = (46, "CRYPTO", 400),
    /// Gateway cannot process requests.
    GATEWAY_UNAVAILABLE = (47, "GATEWAY_UNAVAILABLE", 503),
    /// Gateway could not forward a request or response.
    GATEWAY_FORWARDING = (48, "GATEWAY_FORWARDING", 502),
    /// Request not authorized at the gateway.
    GATEWAY_AUTH = (49, "GATEWAY_AUTH", 407),
    /// Internal gateway failure.
    GATEWAY_FAILURE = (50, "GATEWAY_FAILURE", 502),
    /// Cross-origin policy violation.
    CORS = (51, "CORS", 403),
}

impl Reason {
    /// Wrap a raw value without validation.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Whether the value belongs to the closed set.
    #[inline]
    pub const fn is_known(self) -> bool {
        (self.0 as usize) < Self::ALL.len()
    }
}

// ============================================================================
// Formatting
// ============================================================================

macro_rules! label_fmt {
    ($($ty:ident),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.render())
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($ty), self.render())
                }
            }
        )+
    };
}

label_fmt!(Blame, Namespace, Reason);

/// Build the three part code `BLAME.NAMESPACE.REASON`.
pub fn triple_code(blame: Blame, namespace: Namespace, reason: Reason) -> String {
    let (b, n, r) = (blame.render(), namespace.render(), reason.render());
    let mut code = String::with_capacity(b.len() + n.len() + r.len() + 2);
    code.push_str(b);
    code.push('.');
    code.push_str(n);
    code.push('.');
    code.push_str(r);
    code
}
