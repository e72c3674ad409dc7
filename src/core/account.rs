//! Account identity.
//!
//! The ledger never authenticates anyone. Callers hand it the identity their session
//! layer already vouched for; the only check made here is that one was supplied at all.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the account that owns a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// # Errors
    /// `Error::NotAuthenticated` if `raw` is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds an identity from whatever the session layer produced, which may be nothing.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` if there is no identity or it is blank.
    pub fn from_session(raw: Option<&str>) -> Result<Self> {
        raw.map_or(Err(Error::NotAuthenticated), Self::new)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_blank_identity_is_not_authenticated() {
        assert!(matches!(AccountId::new("  "), Err(Error::NotAuthenticated)));
        assert!(matches!(
            AccountId::from_session(None),
            Err(Error::NotAuthenticated)
        ));
    }

    #[test]
    fn test_identity_is_trimmed() {
        let id = AccountId::from_session(Some(" ada ")).unwrap();
        assert_eq!(id.as_str(), "ada");
        assert_eq!(id.to_string(), "ada");
    }
}
