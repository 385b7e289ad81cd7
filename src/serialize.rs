//! Client-safe serialized form.
//!
//! ```json
//! {
//!   "code": "CLIENT.API.VALIDATION",
//!   "type": "form",
//!   "explain": "2 fields rejected",
//!   "help": "fix the highlighted fields",
//!   "path": "items[0]",
//!   "fields": [ { "code": "...", "path": "name" } ]
//! }
//! ```
//!
//! Only `code` is always present. `multi` (rendered member messages) is used
//! for aggregates built by [`multi`](crate::aggregate::multi), `fields`
//! (recursively serialized members) for any other nested list. Causes,
//! traces and properties are never serialized.

use crate::instance::Instance;
use crate::presets;
use serde::{Serialize, Serializer};

#[derive(Serialize)]
struct ClientView<'a> {
    code: &'a str,
    #[serde(rename = "type", skip_serializing_if = "str::is_empty")]
    kind: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    explain: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    help: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    path: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    multi: Vec<String>,
    #[serde(skip_serializing_if = "<[Instance]>::is_empty")]
    fields: &'a [Instance],
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let aggregate = self.definition() == &*presets::MULTIPLE;
        let (multi, fields) = if aggregate {
            (self.nested().iter().map(Instance::render).collect(), &[][..])
        } else {
            (Vec::new(), self.nested())
        };

        ClientView {
            code: self.code(),
            kind: self.kind(),
            explain: self.explanation(),
            help: self.help(),
            path: self.path(),
            multi,
            fields,
        }
        .serialize(serializer)
    }
}

impl Instance {
    /// Client-safe JSON text.
    ///
    /// ```rust
    /// use oops::Definition;
    ///
    /// let def = Definition::new().with_code("err_test").with_type("test");
    /// let json = def.emit("explain 1").to_json().unwrap();
    /// assert_eq!(json, r#"{"code":"err_test","type":"test","explain":"explain 1"}"#);
    /// ```
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Client-safe JSON value.
    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
