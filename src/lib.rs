//! # Email Integration Library
//!
//! A MIME message builder with:
//! - Validated sender, To, Cc, Bcc and Reply-To address lists
//! - Custom headers, subject, charset-aware content
//! - SMTP session configuration mapped onto a property-based mail session
//! - A build pipeline that produces a message exactly once
//! - RFC 5322 rendering and an async transport seam
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_email::{Email, MailTransport};
//!
//! async fn deliver(transport: &dyn MailTransport) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut email = Email::new();
//!     email
//!         .set_host_name(Some("smtp.example.com"))?
//!         .set_smtp_port(587)?
//!         .set_start_tls_enabled(true)?
//!         .set_authentication("user@example.com", "password")?
//!         .set_from_with_name("sender@example.com", "Sender")?
//!         .add_to("recipient@example.com")?
//!         .set_subject("Hello from Rust!")
//!         .set_msg("This is a test email.")?;
//!
//!     let message_id = email.send(transport).await?;
//!     println!("Message sent with ID: {}", message_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Session and message
pub mod auth;
pub mod message;
pub mod session;

// Draft and build pipeline
pub mod email;

// MIME encoding
pub mod mime;

// Delivery seam
pub mod transport;

// Observability
pub mod observability;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use auth::Credentials;
pub use config::{SessionConfig, SessionConfigBuilder, TlsMode};
pub use email::Email;
pub use errors::{EmailError, EmailErrorKind, EmailResult, ErrorCategory};
pub use message::{DefaultMessageFactory, MessageFactory, MimeMessage};
pub use crate::mime::{MimeEncoder, TransferEncoding};
pub use observability::{EmailMetrics, MetricsSnapshot, Timer};
pub use session::{keys, MailSession, Properties};
pub use transport::MailTransport;
pub use types::{Address, Content, RecipientType};
