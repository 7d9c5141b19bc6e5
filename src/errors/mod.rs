//! Error types for email construction.
//!
//! Every failure carries an [`EmailErrorKind`], and every kind belongs to one
//! [`ErrorCategory`] so callers can tell address problems, bad arguments,
//! build preconditions and state violations apart.

use std::fmt;

use thiserror::Error;

/// Result type for email operations.
pub type EmailResult<T> = Result<T, EmailError>;

/// Email error kinds categorizing different failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailErrorKind {
    // Address errors
    /// Address is empty or fails validation.
    InvalidAddress,
    /// An address list was supplied with no entries.
    EmptyAddressList,

    // Argument errors
    /// Generic invalid argument.
    InvalidArgument,
    /// Header name or value is invalid.
    InvalidHeader,
    /// MIME content type could not be parsed.
    InvalidContentType,
    /// Charset label is unknown.
    InvalidCharset,

    // Build errors
    /// No host is configured and no session was supplied.
    MissingHost,
    /// No sender address is available.
    MissingFrom,
    /// No primary (To) recipient was added.
    MissingRecipients,
    /// The message object could not be constructed or rendered.
    MessageConstruction,

    // State errors
    /// The message has already been built.
    AlreadyBuilt,
    /// The message has not been built yet.
    NotBuilt,
    /// The mail session is already initialized.
    SessionAlreadyInitialized,

    // Transport errors
    /// The transport failed to deliver the message.
    TransportFailed,

    // Configuration errors
    /// Configuration is invalid.
    ConfigurationInvalid,
}

impl EmailErrorKind {
    /// Returns the category this kind belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EmailErrorKind::InvalidAddress | EmailErrorKind::EmptyAddressList => {
                ErrorCategory::Address
            }

            EmailErrorKind::InvalidArgument
            | EmailErrorKind::InvalidHeader
            | EmailErrorKind::InvalidContentType
            | EmailErrorKind::InvalidCharset => ErrorCategory::InvalidArgument,

            EmailErrorKind::MissingHost
            | EmailErrorKind::MissingFrom
            | EmailErrorKind::MissingRecipients
            | EmailErrorKind::MessageConstruction => ErrorCategory::MessageBuild,

            EmailErrorKind::AlreadyBuilt
            | EmailErrorKind::NotBuilt
            | EmailErrorKind::SessionAlreadyInitialized => ErrorCategory::IllegalState,

            EmailErrorKind::TransportFailed => ErrorCategory::Transport,

            EmailErrorKind::ConfigurationInvalid => ErrorCategory::Configuration,
        }
    }
}

impl fmt::Display for EmailErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailErrorKind::InvalidAddress => write!(f, "Invalid address"),
            EmailErrorKind::EmptyAddressList => write!(f, "Empty address list"),
            EmailErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            EmailErrorKind::InvalidHeader => write!(f, "Invalid header"),
            EmailErrorKind::InvalidContentType => write!(f, "Invalid content type"),
            EmailErrorKind::InvalidCharset => write!(f, "Invalid charset"),
            EmailErrorKind::MissingHost => write!(f, "Missing host"),
            EmailErrorKind::MissingFrom => write!(f, "Missing sender address"),
            EmailErrorKind::MissingRecipients => write!(f, "Missing recipients"),
            EmailErrorKind::MessageConstruction => write!(f, "Message construction failed"),
            EmailErrorKind::AlreadyBuilt => write!(f, "Message already built"),
            EmailErrorKind::NotBuilt => write!(f, "Message not built"),
            EmailErrorKind::SessionAlreadyInitialized => write!(f, "Session already initialized"),
            EmailErrorKind::TransportFailed => write!(f, "Transport failed"),
            EmailErrorKind::ConfigurationInvalid => write!(f, "Invalid configuration"),
        }
    }
}

/// Broad error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or empty address input.
    Address,
    /// Empty or malformed argument.
    InvalidArgument,
    /// A build precondition was not met.
    MessageBuild,
    /// Operation not allowed in the current state.
    IllegalState,
    /// Delivery failure reported by the transport.
    Transport,
    /// Invalid configuration.
    Configuration,
}

/// Email error with detailed information.
#[derive(Error, Debug)]
pub struct EmailError {
    /// Error kind.
    kind: EmailErrorKind,
    /// Human-readable message.
    message: String,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EmailError {
    /// Creates a new email error.
    pub fn new(kind: EmailErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Sets the underlying cause.
    pub fn with_cause<E: std::error::Error + Send + Sync + 'static>(mut self, cause: E) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> EmailErrorKind {
        self.kind
    }

    /// Returns the error category.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true for malformed or empty address input.
    pub fn is_address_error(&self) -> bool {
        self.category() == ErrorCategory::Address
    }

    /// Returns true for invalid arguments.
    pub fn is_invalid_argument(&self) -> bool {
        self.category() == ErrorCategory::InvalidArgument
    }

    /// Returns true for build precondition failures.
    pub fn is_build_error(&self) -> bool {
        self.category() == ErrorCategory::MessageBuild
    }

    /// Returns true for state violations.
    pub fn is_illegal_state(&self) -> bool {
        self.category() == ErrorCategory::IllegalState
    }

    // Convenience constructors

    /// Creates an address error.
    pub fn address(message: impl Into<String>) -> Self {
        Self::new(EmailErrorKind::InvalidAddress, message)
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(EmailErrorKind::InvalidArgument, message)
    }

    /// Creates a build error.
    pub fn build(kind: EmailErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message)
    }

    /// Creates an illegal state error.
    pub fn illegal_state(kind: EmailErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(EmailErrorKind::TransportFailed, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(EmailErrorKind::ConfigurationInvalid, message)
    }
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_category() {
        assert_eq!(EmailErrorKind::InvalidAddress.category(), ErrorCategory::Address);
        assert_eq!(EmailErrorKind::EmptyAddressList.category(), ErrorCategory::Address);
        assert_eq!(EmailErrorKind::InvalidHeader.category(), ErrorCategory::InvalidArgument);
        assert_eq!(EmailErrorKind::MissingHost.category(), ErrorCategory::MessageBuild);
        assert_eq!(EmailErrorKind::MissingRecipients.category(), ErrorCategory::MessageBuild);
        assert_eq!(EmailErrorKind::AlreadyBuilt.category(), ErrorCategory::IllegalState);
        assert_eq!(
            EmailErrorKind::SessionAlreadyInitialized.category(),
            ErrorCategory::IllegalState
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = EmailError::address("Illegal address");
        assert!(err.is_address_error());
        assert!(!err.is_build_error());

        let err = EmailError::build(EmailErrorKind::MissingFrom, "From address required");
        assert!(err.is_build_error());
        assert_eq!(err.kind(), EmailErrorKind::MissingFrom);

        let err = EmailError::illegal_state(EmailErrorKind::AlreadyBuilt, "built");
        assert!(err.is_illegal_state());
    }

    #[test]
    fn test_error_display_and_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = EmailError::transport("Sending failed").with_cause(cause);

        assert_eq!(err.to_string(), "Transport failed: Sending failed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
