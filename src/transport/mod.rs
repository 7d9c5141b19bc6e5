//! Delivery seam for built messages.
//!
//! The connection, TLS and SMTP dialogue live behind [`MailTransport`]; this
//! crate only hands over a finished [`MimeMessage`] whose session carries the
//! host, port, timeouts and credentials.

use std::fmt;

use async_trait::async_trait;

use crate::errors::EmailResult;
use crate::message::MimeMessage;

/// Trait for mail transport abstraction.
#[async_trait]
pub trait MailTransport: Send + Sync + fmt::Debug {
    /// Delivers a built message to all of its envelope recipients.
    async fn send(&self, message: &MimeMessage) -> EmailResult<()>;
}
