//! Read-only catalogue of the definitions a service uses.
//!
//! Definitions are built during an explicit initialisation phase, registered
//! once, and the frozen [`Registry`] is passed to whatever needs lookups by
//! code (documentation endpoints, decoding stored codes, startup checks).
//!
//! # Governance
//!
//! - Every registered definition has a non-empty code.
//! - A code belongs to exactly one definition.
//! - Registering the same definition twice is a no-op.
//!
//! ```rust
//! use oops::{Definition, Registry};
//!
//! let not_found = Definition::new().with_code("err_not_found");
//! let conflict = Definition::new().with_code("err_conflict");
//!
//! let registry = Registry::builder()
//!     .with_presets()?
//!     .register(&not_found)?
//!     .register(&conflict)?
//!     .build();
//!
//! assert_eq!(registry.get("err_conflict"), Some(&conflict));
//! assert!(registry.contains(&oops::presets::UNEXPECTED));
//! # Ok::<(), oops::RegistryError>(())
//! ```

use crate::definition::Definition;
use crate::presets;
use std::collections::HashMap;
use std::fmt;

/// Governance violation raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another definition already owns this code.
    DuplicateCode {
        /// The contested code.
        code: String,
    },
    /// The definition has no code and cannot be looked up.
    EmptyCode,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCode { code } => write!(
                f,
                "code '{}' is already registered to a different definition",
                code
            ),
            Self::EmptyCode => f.write_str("definitions must have a non-empty code to be registered"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Mutable phase of a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    by_code: HashMap<String, Definition>,
    order: Vec<Definition>,
}

impl RegistryBuilder {
    /// Register a definition.
    pub fn register(&mut self, definition: &Definition) -> Result<&mut Self, RegistryError> {
        let code = definition.code();
        if code.is_empty() {
            return Err(RegistryError::EmptyCode);
        }

        match self.by_code.get(code).map(|existing| existing == definition) {
            Some(true) => return Ok(self),
            Some(false) => {
                return Err(RegistryError::DuplicateCode {
                    code: code.to_string(),
                });
            }
            None => {}
        }

        self.by_code.insert(code.to_string(), definition.clone());
        self.order.push(definition.clone());
        Ok(self)
    }

    /// Register every definition, stopping at the first violation.
    pub fn register_all<'d, I>(&mut self, definitions: I) -> Result<&mut Self, RegistryError>
    where
        I: IntoIterator<Item = &'d Definition>,
    {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(self)
    }

    /// Register the crate's own presets.
    ///
    /// Their codes are disjoint, so this only fails when a look-alike
    /// already owns one of their codes.
    pub fn with_presets(&mut self) -> Result<&mut Self, RegistryError> {
        self.register_all([&*presets::UNEXPECTED, &*presets::TODO, &*presets::MULTIPLE])
    }

    /// Freeze into a read-only registry.
    pub fn build(&mut self) -> Registry {
        let taken = std::mem::take(self);
        Registry {
            by_code: taken.by_code,
            order: taken.order,
        }
    }
}

/// Frozen code → definition catalogue.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_code: HashMap<String, Definition>,
    order: Vec<Definition>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Definition owning `code`.
    pub fn get(&self, code: &str) -> Option<&Definition> {
        self.by_code.get(code)
    }

    /// Whether this exact definition is registered.
    pub fn contains(&self, definition: &Definition) -> bool {
        self.by_code
            .get(definition.code())
            .is_some_and(|existing| existing == definition)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered definitions in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Definition> {
        self.order.iter()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Definition;
    type IntoIter = std::slice::Iter<'a, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}
