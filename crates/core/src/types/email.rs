//! Email address type used as the login identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is longer than [`Email::MAX_LENGTH`].
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not have exactly one `@`.
    #[error("email must contain exactly one @ symbol")]
    InvalidAtSymbol,
    /// The mailbox part before `@` is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain is empty or has no dot-separated labels.
    #[error("email domain is invalid")]
    InvalidDomain,
}

/// A normalised (trimmed, lowercase) email address.
///
/// Accounts are looked up by email, so normalising on parse keeps
/// `Cliente@Loja.com` and `cliente@loja.com` the same account.
///
/// ```
/// use loja_core::Email;
///
/// let email = Email::parse("  Cliente@Loja.COM ").unwrap();
/// assert_eq!(email.as_str(), "cliente@loja.com");
/// assert!(Email::parse("cliente@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalise an email address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first structural problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::InvalidAtSymbol);
        };

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let email = Email::parse(" Maria.Silva@Exemplo.com.br\n").unwrap();
        assert_eq!(email.as_str(), "maria.silva@exemplo.com.br");
    }

    #[test]
    fn test_parse_rejects_structural_errors() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("sem-arroba"), Err(EmailError::InvalidAtSymbol));
        assert_eq!(Email::parse("a@b@c.com"), Err(EmailError::InvalidAtSymbol));
        assert_eq!(Email::parse("@loja.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("a@loja"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("a@loja..com"), Err(EmailError::InvalidDomain));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@loja.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_serializes_transparently() {
        let email = Email::parse("a@loja.com").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"a@loja.com\"");
    }
}
