//! Core types for email construction.
//!
//! This module provides:
//! - Address types with validation
//! - Recipient roles
//! - Body content with a parsed MIME type

use std::fmt;

use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::errors::{EmailError, EmailErrorKind, EmailResult};

/// RFC 5322 specials that cannot appear unquoted in an address (`@` is
/// checked separately).
const ADDRESS_SPECIALS: &str = "()<>[]:;,\\\"";

/// Email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Display name (e.g., "John Doe").
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com").
    pub email: String,
}

impl Address {
    /// Creates a new address with just an email.
    pub fn new(email: impl Into<String>) -> EmailResult<Self> {
        let email = email.into();
        Self::validate_email(&email)?;
        Ok(Self { name: None, email })
    }

    /// Creates a new address with display name and email.
    ///
    /// An empty display name is treated as absent.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> EmailResult<Self> {
        let email = email.into();
        Self::validate_email(&email)?;
        let name = name.into();
        Ok(Self {
            name: if name.is_empty() { None } else { Some(name) },
            email,
        })
    }

    /// Parses an address from a string (e.g., "John Doe <john@example.com>").
    pub fn parse(s: &str) -> EmailResult<Self> {
        let s = s.trim();

        if let Some(start) = s.find('<') {
            if let Some(end) = s.rfind('>') {
                if end > start {
                    let name = s[..start].trim().trim_matches('"');
                    let email = s[start + 1..end].trim();
                    return Self::with_name(name, email);
                }
            }
        }

        Self::new(s)
    }

    fn validate_email(email: &str) -> EmailResult<()> {
        if email.is_empty() {
            return Err(EmailError::address("Email address cannot be empty"));
        }

        if email.len() > 254 {
            return Err(EmailError::address(
                "Email address too long (max 254 characters)",
            ));
        }

        if email.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(EmailError::address(format!(
                "Email address cannot contain whitespace or control characters: {:?}",
                email
            )));
        }

        if let Some(special) = email.chars().find(|c| ADDRESS_SPECIALS.contains(*c)) {
            return Err(EmailError::address(format!(
                "Email address cannot contain {:?} outside a quoted string: {}",
                special, email
            )));
        }

        let (local, domain) = match email.split_once('@') {
            Some((local, domain)) if !domain.contains('@') => (local, domain),
            _ => {
                return Err(EmailError::address(format!(
                    "Email address must contain exactly one @: {}",
                    email
                )))
            }
        };

        if local.is_empty() || local.len() > 64 {
            return Err(EmailError::address("Local part must be 1-64 characters"));
        }

        if domain.is_empty() {
            return Err(EmailError::address("Domain cannot be empty"));
        }

        Ok(())
    }

    /// Returns the email part only.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name if present.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the domain part of the address.
    pub fn domain(&self) -> &str {
        self.email.rsplit('@').next().unwrap_or_default()
    }

    /// Formats the address for SMTP MAIL FROM/RCPT TO commands.
    pub fn to_smtp(&self) -> String {
        format!("<{}>", self.email)
    }

    /// Formats the address for email headers.
    pub fn to_header(&self) -> String {
        match &self.name {
            Some(name) => {
                if name.contains(|c: char| !c.is_alphanumeric() && c != ' ') {
                    format!("\"{}\" <{}>", name.replace('"', "\\\""), self.email)
                } else {
                    format!("{} <{}>", name, self.email)
                }
            }
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_header())
    }
}

impl TryFrom<&str> for Address {
    type Error = EmailError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Address::parse(&s)
    }
}

/// Recipient role on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientType {
    /// Primary recipients.
    To,
    /// Carbon copy recipients.
    Cc,
    /// Blind carbon copy recipients (never rendered as a header).
    Bcc,
}

impl RecipientType {
    /// Returns the header name for this role.
    pub fn header_name(&self) -> &'static str {
        match self {
            RecipientType::To => "To",
            RecipientType::Cc => "Cc",
            RecipientType::Bcc => "Bcc",
        }
    }
}

impl fmt::Display for RecipientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header_name())
    }
}

/// Message body with its MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    /// Body text.
    pub data: String,
    /// MIME type of the body.
    pub mime: Mime,
}

impl Content {
    /// Creates content with an explicit MIME type (e.g., "text/html").
    pub fn new(data: impl Into<String>, content_type: &str) -> EmailResult<Self> {
        let mime = content_type.trim().parse::<Mime>().map_err(|e| {
            EmailError::new(
                EmailErrorKind::InvalidContentType,
                format!("Invalid content type: {}", content_type),
            )
            .with_cause(e)
        })?;

        Ok(Self {
            data: data.into(),
            mime,
        })
    }

    /// Creates plain text content.
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime::TEXT_PLAIN,
        }
    }

    /// Returns the charset parameter of the MIME type, if any.
    pub fn charset(&self) -> Option<&str> {
        self.mime.get_param(mime::CHARSET).map(|c| c.as_str())
    }

    /// Returns true if the MIME type is `text/*`.
    pub fn is_text(&self) -> bool {
        self.mime.type_() == mime::TEXT
    }
}
