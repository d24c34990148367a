//! Tenant identifier type.
//!
//! This module defines the [`TenantId`] type, the opaque value that tenant
//! foreign keys are compared against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque tenant identifier.
///
/// Identity of a tenant is decided by this value alone. Numeric database keys
/// are carried in their decimal rendering so that `42` and `"42"` stored in a
/// foreign key column compare equal.
///
/// # Examples
///
/// ```
/// use helios_multitenant::tenant::TenantId;
///
/// let tenant = TenantId::new("acme");
/// assert_eq!(tenant.as_str(), "acme");
/// assert_eq!(TenantId::from(42_u64), TenantId::new("42"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant ID from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads a tenant ID out of a stored field value.
    ///
    /// Non-empty strings and integers are accepted. Anything else yields
    /// `None`, whether the field is unset (`null`, `""`) or holds a value that
    /// cannot name a tenant (booleans, floats, arrays, objects).
    pub fn from_value(value: &Value) -> Option<TenantId> {
        match value {
            Value::String(s) if !s.is_empty() => Some(TenantId::new(s.as_str())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(TenantId::new(n.to_string())),
            _ => None,
        }
    }

    /// Converts this ID into the value written to a foreign key field.
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TenantId::new(s))
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl From<u64> for TenantId {
    fn from(n: u64) -> Self {
        TenantId::new(n.to_string())
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
