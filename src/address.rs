//! Mailbox address with an optional display name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A mailbox such as `alice@example.com` or `Alice <alice@example.com>`.
///
/// Addresses are carried to the transport verbatim. Whether a mailbox is
/// acceptable is for the provider to decide.
///
/// ```
/// use mailroom::Address;
///
/// let addr: Address = ("Alice", "alice@example.com").into();
/// assert_eq!(addr.formatted(), "Alice <alice@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name
    pub name: Option<String>,
    /// Mailbox, e.g. "alice@example.com"
    pub email: String,
}

impl Address {
    /// Address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Address with a display name.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Format as "Name <email>" or just "email" if there is no name.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => format!("{} <{}>", name, self.email),
            _ => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

impl<N: Into<String>, E: Into<String>> From<(N, E)> for Address {
    fn from((name, email): (N, E)) -> Self {
        Self::with_name(name, email)
    }
}

/// Conversion into an [`Address`] for the `Email` builder methods.
///
/// Implement it on your own types (users, contacts) to pass them straight
/// to `.to(..)`, `.from(..)` and friends.
pub trait ToAddress {
    /// Produce the address.
    fn to_address(&self) -> Address;
}

impl<T: ToAddress + ?Sized> ToAddress for &T {
    fn to_address(&self) -> Address {
        (**self).to_address()
    }
}

impl ToAddress for Address {
    fn to_address(&self) -> Address {
        self.clone()
    }
}

impl ToAddress for str {
    fn to_address(&self) -> Address {
        Address::new(self)
    }
}

impl ToAddress for String {
    fn to_address(&self) -> Address {
        Address::new(self.as_str())
    }
}

impl<N: AsRef<str>, E: AsRef<str>> ToAddress for (N, E) {
    fn to_address(&self) -> Address {
        Address::with_name(self.0.as_ref(), self.1.as_ref())
    }
}
