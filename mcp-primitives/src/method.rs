//! Method identifiers and the registry that keeps them unique.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const MAX_ID_LEN: usize = 64;

/// Enablement token meaning "every toolset". Never a valid [`Method`].
pub const ALL_METHODS: &str = "all";

/// Identifier for one exposed operation, e.g. `twdesk-list_tickets`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Method(String);

impl Method {
    /// Creates a method identifier after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMethod`] if the identifier is empty, too long, or
    /// contains unsupported characters, and [`Error::ReservedMethod`] for the
    /// `all` sentinel.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the surface prefix (`twdesk` for `twdesk-list_tickets`).
    #[must_use]
    pub fn surface(&self) -> Option<&str> {
        self.0.split_once('-').map(|(surface, _)| surface)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Method {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Method> for String {
    fn from(value: Method) -> Self {
        value.0
    }
}

impl TryFrom<String> for Method {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidMethod {
            id: String::new(),
            reason: "identifier cannot be empty".into(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(Error::InvalidMethod {
            id: id.into(),
            reason: format!("identifier length must be <= {MAX_ID_LEN}"),
        });
    }

    if !id
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
    {
        return Err(Error::InvalidMethod {
            id: id.into(),
            reason: "identifier must contain lowercase alphanumeric, dash, underscore, or dot"
                .into(),
        });
    }

    if id == ALL_METHODS {
        return Err(Error::ReservedMethod { id: id.into() });
    }

    Ok(())
}

/// Table of every method declared by the loaded integration surfaces.
///
/// Populated once during startup and shared by reference afterwards. Only
/// [`register`](Self::register) and [`is_registered`](Self::is_registered) are
/// exposed so that uniqueness stays enforceable.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: BTreeSet<Method>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMethod`] when the identifier is already
    /// registered, or a validation error from [`Method::new`].
    pub fn register(&mut self, id: impl Into<String>) -> Result<Method> {
        let method = Method::new(id)?;
        if self.methods.contains(&method) {
            return Err(Error::DuplicateMethod { id: method.0 });
        }

        debug!(method = %method, "method registered");
        self.methods.insert(method.clone());
        Ok(method)
    }

    /// Reports whether the identifier has been declared.
    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        self.methods.contains(id)
    }

    /// Returns the number of declared methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` when no method has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
