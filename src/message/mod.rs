//! The transport-ready message object and the factory that creates it.

use std::fmt;

use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use mime::Mime;

use crate::errors::EmailResult;
use crate::mime::MimeEncoder;
use crate::session::MailSession;
use crate::types::{Address, RecipientType};

/// Mutable MIME message bound to a mail session.
///
/// The build pipeline fills one of these in; once stored by the draft it is
/// only reachable through shared references.
#[derive(Debug, Clone)]
pub struct MimeMessage {
    session: MailSession,
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Vec<Address>,
    subject: Option<String>,
    sent_date: Option<DateTime<Utc>>,
    body: String,
    content_type: Mime,
    charset: &'static Encoding,
    headers: Vec<(String, String)>,
    message_id: Option<String>,
}

impl MimeMessage {
    /// Creates an empty plain-text message bound to a session.
    pub fn new(session: MailSession) -> Self {
        Self {
            session,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: None,
            sent_date: None,
            body: String::new(),
            content_type: mime::TEXT_PLAIN,
            charset: encoding_rs::UTF_8,
            headers: Vec::new(),
            message_id: None,
        }
    }

    /// Returns the session this message is bound to.
    pub fn session(&self) -> &MailSession {
        &self.session
    }

    /// Sets the sender.
    pub fn set_from(&mut self, from: Address) {
        self.from = Some(from);
    }

    /// Returns the sender.
    pub fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    /// Replaces the recipients for a role.
    pub fn set_recipients(&mut self, kind: RecipientType, addresses: Vec<Address>) {
        match kind {
            RecipientType::To => self.to = addresses,
            RecipientType::Cc => self.cc = addresses,
            RecipientType::Bcc => self.bcc = addresses,
        }
    }

    /// Returns the recipients for a role.
    pub fn recipients(&self, kind: RecipientType) -> &[Address] {
        match kind {
            RecipientType::To => &self.to,
            RecipientType::Cc => &self.cc,
            RecipientType::Bcc => &self.bcc,
        }
    }

    /// Returns all envelope recipients (to + cc + bcc).
    pub fn all_recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// Sets the reply-to list.
    pub fn set_reply_to(&mut self, addresses: Vec<Address>) {
        self.reply_to = addresses;
    }

    /// Returns the reply-to list.
    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    /// Sets the subject.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = Some(subject.into());
    }

    /// Returns the subject.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Sets the sent date.
    pub fn set_sent_date(&mut self, date: DateTime<Utc>) {
        self.sent_date = Some(date);
    }

    /// Returns the sent date.
    pub fn sent_date(&self) -> Option<DateTime<Utc>> {
        self.sent_date
    }

    /// Sets the body and its MIME type.
    pub fn set_content(&mut self, body: impl Into<String>, content_type: Mime) {
        self.body = body.into();
        self.content_type = content_type;
    }

    /// Sets a plain text body.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.set_content(text, mime::TEXT_PLAIN);
    }

    /// Returns the body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the body MIME type.
    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    /// Sets the charset used to encode headers and text bodies.
    pub fn set_charset(&mut self, charset: &'static Encoding) {
        self.charset = charset;
    }

    /// Returns the charset used to encode headers and text bodies.
    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    /// Appends a header; existing headers with the same name are kept.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Returns the first value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns all custom headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Sets the message ID (without angle brackets).
    pub fn set_message_id(&mut self, id: impl Into<String>) {
        self.message_id = Some(id.into());
    }

    /// Returns the message ID.
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Renders the message in RFC 5322 format.
    pub fn to_bytes(&self) -> EmailResult<Vec<u8>> {
        MimeEncoder::new().encode(self)
    }
}

/// Creates message objects for the build pipeline.
pub trait MessageFactory: Send + Sync + fmt::Debug {
    /// Creates an empty message bound to the session.
    fn create_message(&self, session: &MailSession) -> EmailResult<MimeMessage>;
}

/// Factory producing plain [`MimeMessage`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessageFactory;

impl MessageFactory for DefaultMessageFactory {
    fn create_message(&self, session: &MailSession) -> EmailResult<MimeMessage> {
        Ok(MimeMessage::new(session.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{keys, Properties};

    fn session() -> MailSession {
        let props: Properties = [(keys::MAIL_HOST, "smtp.example.com")].into_iter().collect();
        MailSession::new(props)
    }

    #[test]
    fn test_default_factory_binds_session() {
        let message = DefaultMessageFactory.create_message(&session()).unwrap();
        assert_eq!(message.session().host(), Some("smtp.example.com"));
        assert_eq!(message.content_type(), &mime::TEXT_PLAIN);
        assert_eq!(message.body(), "");
        assert!(message.from().is_none());
    }

    #[test]
    fn test_recipients_by_role() {
        let mut message = MimeMessage::new(session());
        message.set_recipients(RecipientType::To, vec![Address::new("a@example.com").unwrap()]);
        message.set_recipients(RecipientType::Bcc, vec![Address::new("b@example.com").unwrap()]);

        assert_eq!(message.recipients(RecipientType::To).len(), 1);
        assert!(message.recipients(RecipientType::Cc).is_empty());
        assert_eq!(message.all_recipients().count(), 2);
    }

    #[test]
    fn test_headers_append() {
        let mut message = MimeMessage::new(session());
        message.add_header("X-Mailer", "one");
        message.add_header("X-Mailer", "two");

        assert_eq!(message.headers().len(), 2);
        assert_eq!(message.header("x-mailer"), Some("one"));
    }
}
