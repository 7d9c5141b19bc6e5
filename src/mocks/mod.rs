//! Mock implementations for testing.
//!
//! Provides a recording message factory, a mock transport and fixtures.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::email::Email;
use crate::errors::{EmailError, EmailResult};
use crate::message::{MessageFactory, MimeMessage};
use crate::session::MailSession;
use crate::transport::MailTransport;

/// Message factory that records every session it is asked to bind.
#[derive(Debug, Clone, Default)]
pub struct MockMessageFactory {
    sessions: Arc<Mutex<Vec<MailSession>>>,
    fail_next: Arc<Mutex<Option<EmailError>>>,
}

impl MockMessageFactory {
    /// Creates a new mock factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the next call to fail.
    pub fn fail_next_with(&self, error: EmailError) -> &Self {
        *self.fail_next.lock().unwrap() = Some(error);
        self
    }

    /// Returns the sessions messages were created for.
    pub fn recorded_sessions(&self) -> Vec<MailSession> {
        self.sessions.lock().unwrap().clone()
    }

    /// Returns how many messages were created.
    pub fn created_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

impl MessageFactory for MockMessageFactory {
    fn create_message(&self, session: &MailSession) -> EmailResult<MimeMessage> {
        if let Some(error) = self.fail_next.lock().unwrap().take() {
            return Err(error);
        }

        self.sessions.lock().unwrap().push(session.clone());
        Ok(MimeMessage::new(session.clone()))
    }
}

/// Mock transport recording delivered messages.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    messages: Arc<Mutex<Vec<MimeMessage>>>,
    data_received: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_next: Arc<Mutex<Option<EmailError>>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the next call to fail.
    pub fn fail_next_with(&self, error: EmailError) -> &Self {
        *self.fail_next.lock().unwrap() = Some(error);
        self
    }

    /// Returns delivered messages.
    pub fn sent_messages(&self) -> Vec<MimeMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Returns the rendered bytes of delivered messages.
    pub fn received_data(&self) -> Vec<Vec<u8>> {
        self.data_received.lock().unwrap().clone()
    }

    /// Clears recorded data.
    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
        self.data_received.lock().unwrap().clear();
        *self.fail_next.lock().unwrap() = None;
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, message: &MimeMessage) -> EmailResult<()> {
        if let Some(error) = self.fail_next.lock().unwrap().take() {
            return Err(error);
        }

        let data = message.to_bytes()?;
        self.data_received.lock().unwrap().push(data);
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Creates a draft with host, port, sender, recipients, subject and content set.
pub fn test_email() -> EmailResult<Email> {
    let mut email = Email::new();
    email
        .set_host_name(Some("smtp.example.com"))?
        .set_smtp_port(1234)?
        .set_from("sender@example.com")?
        .add_to("recipient@example.com")?
        .set_subject("Test Subject")
        .set_msg("Test body")?;
    Ok(email)
}

/// Creates a draft using the given factory, otherwise like [`test_email`].
pub fn test_email_with_factory(factory: Arc<dyn MessageFactory>) -> EmailResult<Email> {
    let mut email = Email::with_factory(factory);
    email
        .set_host_name(Some("smtp.example.com"))?
        .set_from("sender@example.com")?
        .add_to("recipient@example.com")?
        .set_subject("Test Subject");
    Ok(email)
}
