//! The email draft and its build pipeline.
//!
//! An [`Email`] accumulates recipients, headers, subject, content and the
//! session configuration, then produces a [`MimeMessage`] exactly once:
//!
//! ```rust
//! use integrations_email::{Content, Email};
//!
//! fn main() -> Result<(), integrations_email::EmailError> {
//!     let mut email = Email::new();
//!     email
//!         .set_host_name(Some("smtp.example.com"))?
//!         .set_smtp_port(587)?
//!         .set_from("sender@example.com")?
//!         .add_to("recipient@example.com")?
//!         .add_header("X-Priority", "1")?
//!         .set_subject("Hello")
//!         .set_content(Content::text("Hi there"));
//!
//!     let message = email.build_mime_message()?;
//!     assert_eq!(message.subject(), Some("Hello"));
//!
//!     // A draft builds only once.
//!     assert!(email.build_mime_message().is_err());
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use mime::Mime;
use secrecy::SecretString;

use crate::config::{SessionConfig, TlsMode};
use crate::errors::{EmailError, EmailErrorKind, EmailResult};
use crate::message::{DefaultMessageFactory, MessageFactory, MimeMessage};
use crate::mime::MimeEncoder;
use crate::observability::{EmailMetrics, Timer};
use crate::session::{keys, MailSession};
use crate::transport::MailTransport;
use crate::types::{Address, Content, RecipientType};

/// Build lifecycle of a draft.
#[derive(Debug)]
enum BuildState {
    Unbuilt,
    Built(Box<MimeMessage>),
}

impl BuildState {
    fn message(&self) -> Option<&MimeMessage> {
        match self {
            BuildState::Unbuilt => None,
            BuildState::Built(message) => Some(message),
        }
    }
}

/// Mutable email draft.
///
/// Configuration setters fail with an illegal-state error once a mail
/// session exists, whether it was supplied with [`Email::set_mail_session`]
/// or resolved by [`Email::mail_session`].
#[derive(Debug)]
pub struct Email {
    config: SessionConfig,
    session: Option<MailSession>,
    factory: Arc<dyn MessageFactory>,
    metrics: Option<Arc<EmailMetrics>>,
    charset: Option<&'static Encoding>,
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Vec<Address>,
    headers: HashMap<String, String>,
    subject: Option<String>,
    content: Option<Content>,
    sent_date: Option<DateTime<Utc>>,
    state: BuildState,
}

impl Default for Email {
    fn default() -> Self {
        Self::with_factory(Arc::new(DefaultMessageFactory))
    }
}

impl Email {
    /// Creates an empty draft using the default message factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty draft using a custom message factory.
    pub fn with_factory(factory: Arc<dyn MessageFactory>) -> Self {
        Self {
            config: SessionConfig::default(),
            session: None,
            factory,
            metrics: None,
            charset: None,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            headers: HashMap::new(),
            subject: None,
            content: None,
            sent_date: None,
            state: BuildState::Unbuilt,
        }
    }

    /// Creates an empty draft from a session configuration.
    pub fn from_config(config: SessionConfig) -> Self {
        let mut email = Self::new();
        email.config = config;
        email
    }

    /// Attaches a metrics collector.
    pub fn with_metrics(mut self, metrics: Arc<EmailMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn ensure_session_uninitialized(&self) -> EmailResult<()> {
        if self.session.is_some() {
            return Err(EmailError::illegal_state(
                EmailErrorKind::SessionAlreadyInitialized,
                "The mail session is already initialized",
            ));
        }
        Ok(())
    }

    // Session configuration

    /// Sets the SMTP host. `None` clears it.
    pub fn set_host_name(&mut self, host: Option<&str>) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.host = host.map(str::to_string);
        Ok(self)
    }

    /// Returns the SMTP host.
    ///
    /// A session, when present, is authoritative; otherwise the configured
    /// host is returned if it is non-empty.
    pub fn host_name(&self) -> Option<&str> {
        match &self.session {
            Some(session) => session.host(),
            None => self.config.host(),
        }
    }

    /// Sets the SMTP port.
    pub fn set_smtp_port(&mut self, port: u16) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        if port == 0 {
            return Err(EmailError::invalid_argument(
                "Cannot connect to a port number that is less than 1 ( 0 )",
            ));
        }
        self.config.smtp_port = port;
        Ok(self)
    }

    /// Returns the SMTP port.
    pub fn smtp_port(&self) -> u16 {
        self.session
            .as_ref()
            .and_then(MailSession::port)
            .unwrap_or(self.config.smtp_port)
    }

    /// Sets the port used with SSL on connect.
    pub fn set_ssl_smtp_port(&mut self, port: u16) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        if port == 0 {
            return Err(EmailError::invalid_argument(
                "Cannot connect to a port number that is less than 1 ( 0 )",
            ));
        }
        self.config.ssl_smtp_port = port;
        Ok(self)
    }

    /// Returns the port used with SSL on connect.
    pub fn ssl_smtp_port(&self) -> u16 {
        self.session
            .as_ref()
            .and_then(|s| s.property(keys::MAIL_SMTP_SOCKET_FACTORY_PORT))
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.config.ssl_smtp_port)
    }

    /// Enables implicit TLS on connect.
    pub fn set_ssl_on_connect(&mut self, ssl: bool) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.ssl_on_connect = ssl;
        Ok(self)
    }

    /// Returns true if implicit TLS is enabled.
    pub fn is_ssl_on_connect(&self) -> bool {
        self.config.ssl_on_connect
    }

    /// Enables STARTTLS.
    pub fn set_start_tls_enabled(&mut self, enabled: bool) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.start_tls_enabled = enabled;
        Ok(self)
    }

    /// Returns true if STARTTLS is enabled.
    pub fn is_start_tls_enabled(&self) -> bool {
        self.config.start_tls_enabled
    }

    /// Requires STARTTLS.
    pub fn set_start_tls_required(&mut self, required: bool) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.start_tls_required = required;
        Ok(self)
    }

    /// Returns true if STARTTLS is required.
    pub fn is_start_tls_required(&self) -> bool {
        self.config.start_tls_required
    }

    /// Enables server identity checks for TLS connections.
    pub fn set_ssl_check_server_identity(&mut self, check: bool) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.ssl_check_server_identity = check;
        Ok(self)
    }

    /// Returns true if server identity checks are enabled.
    pub fn is_ssl_check_server_identity(&self) -> bool {
        self.config.ssl_check_server_identity
    }

    /// Allows sending when some recipients are rejected.
    pub fn set_send_partial(&mut self, send_partial: bool) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.send_partial = send_partial;
        Ok(self)
    }

    /// Returns true if partial sends are allowed.
    pub fn is_send_partial(&self) -> bool {
        self.config.send_partial
    }

    /// Returns the transport security mode.
    pub fn tls_mode(&self) -> TlsMode {
        match &self.session {
            Some(session) => session.tls_mode(),
            None => self.config.tls_mode(),
        }
    }

    /// Enables transport debug output.
    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.config.debug = debug;
        self
    }

    /// Sets the credentials used for SMTP authentication.
    pub fn set_authentication(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.username = Some(username.into());
        self.config.password = Some(SecretString::new(password.into()));
        Ok(self)
    }

    /// Sets the bounce (return-path) address. `None` clears it.
    pub fn set_bounce_address(&mut self, address: Option<&str>) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.bounce_address = match address {
            Some(address) => Some(Address::parse(address)?.email),
            None => None,
        };
        Ok(self)
    }

    /// Returns the bounce address.
    pub fn bounce_address(&self) -> Option<&str> {
        self.config.bounce_address.as_deref()
    }

    /// Sets the socket read timeout passed to the transport.
    pub fn set_socket_timeout(&mut self, timeout: Duration) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.socket_timeout = timeout;
        Ok(self)
    }

    /// Returns the socket read timeout.
    pub fn socket_timeout(&self) -> Duration {
        self.config.socket_timeout
    }

    /// Sets the socket connection timeout passed to the transport.
    pub fn set_socket_connection_timeout(&mut self, timeout: Duration) -> EmailResult<&mut Self> {
        self.ensure_session_uninitialized()?;
        self.config.socket_connection_timeout = timeout;
        Ok(self)
    }

    /// Returns the socket connection timeout.
    pub fn socket_connection_timeout(&self) -> Duration {
        self.config.socket_connection_timeout
    }

    /// Supplies a pre-built mail session.
    ///
    /// When the session asks for authentication but carries no credentials,
    /// they are taken from its `mail.smtp.user` and `mail.smtp.password`
    /// properties if both are non-empty.
    pub fn set_mail_session(&mut self, session: MailSession) -> &mut Self {
        let props = session.properties();
        let derived = if props.is_true(keys::MAIL_SMTP_AUTH) && session.credentials().is_none() {
            match (props.get(keys::MAIL_SMTP_USER), props.get(keys::MAIL_SMTP_PASSWORD)) {
                (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                    Some(crate::auth::Credentials::plain(user, password))
                }
                _ => None,
            }
        } else {
            None
        };

        self.session = Some(match derived {
            Some(credentials) => session.with_credentials(credentials),
            None => session,
        });
        self
    }

    /// Returns the mail session, resolving and caching it from the
    /// configuration on first use.
    ///
    /// Fails if no session was supplied and no host is configured.
    pub fn mail_session(&mut self) -> EmailResult<&MailSession> {
        let session = match self.session.take() {
            Some(session) => session,
            None => MailSession::from_config(&self.config)?,
        };
        Ok(&*self.session.insert(session))
    }

    // Content

    /// Sets the charset for headers and text bodies (e.g., "ISO-8859-1").
    ///
    /// Labels resolve through the WHATWG Encoding Standard, so the message
    /// is labeled with the canonical name: "ISO-8859-1", "latin1" and
    /// "US-ASCII" all become `windows-1252`, a superset of ISO-8859-1 that
    /// mail readers decode the same way. Text the charset cannot represent
    /// is sent as UTF-8 instead.
    pub fn set_charset(&mut self, label: &str) -> EmailResult<&mut Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            EmailError::new(
                EmailErrorKind::InvalidCharset,
                format!("Unknown charset: {}", label),
            )
        })?;
        self.charset = Some(encoding);
        Ok(self)
    }

    /// Returns the charset name, if one is set.
    pub fn charset(&self) -> Option<&'static str> {
        self.charset.map(Encoding::name)
    }

    /// Sets the subject.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Returns the subject.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Sets the body content. `None` builds a message with an empty body.
    ///
    /// A `charset` parameter on the content type also becomes the draft
    /// charset.
    pub fn set_content(&mut self, content: impl Into<Option<Content>>) -> &mut Self {
        let content = content.into();
        if let Some(encoding) = content
            .as_ref()
            .and_then(Content::charset)
            .and_then(|c| Encoding::for_label(c.as_bytes()))
        {
            self.charset = Some(encoding);
        }
        self.content = content;
        self
    }

    /// Returns the body content.
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Sets a plain text body.
    pub fn set_msg(&mut self, msg: &str) -> EmailResult<&mut Self> {
        if msg.is_empty() {
            return Err(EmailError::invalid_argument("Invalid message supplied"));
        }
        Ok(self.set_content(Content::text(msg)))
    }

    /// Sets the sent date.
    pub fn set_sent_date(&mut self, date: DateTime<Utc>) -> &mut Self {
        self.sent_date = Some(date);
        self
    }

    /// Returns the sent date, or the current time when none was set.
    pub fn sent_date(&self) -> DateTime<Utc> {
        self.sent_date.unwrap_or_else(Utc::now)
    }

    // Sender and recipients

    /// Sets the sender (accepts `Name <email>` form).
    pub fn set_from(&mut self, email: &str) -> EmailResult<&mut Self> {
        self.from = Some(Address::parse(email)?);
        Ok(self)
    }

    /// Sets the sender with a display name.
    pub fn set_from_with_name(&mut self, email: &str, name: &str) -> EmailResult<&mut Self> {
        self.from = Some(Address::with_name(name, email)?);
        Ok(self)
    }

    /// Returns the sender.
    pub fn from_address(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    /// Adds a To recipient.
    pub fn add_to(&mut self, email: &str) -> EmailResult<&mut Self> {
        self.to.push(Address::parse(email)?);
        Ok(self)
    }

    /// Adds a To recipient with a display name.
    pub fn add_to_with_name(&mut self, email: &str, name: &str) -> EmailResult<&mut Self> {
        self.to.push(Address::with_name(name, email)?);
        Ok(self)
    }

    /// Adds several To recipients; nothing is added if any is invalid.
    pub fn add_to_many<I, S>(&mut self, emails: I) -> EmailResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_all(emails)?;
        self.to.extend(addresses);
        Ok(self)
    }

    /// Replaces the To recipients.
    pub fn set_to(&mut self, addresses: Vec<Address>) -> EmailResult<&mut Self> {
        self.to = non_empty(addresses)?;
        Ok(self)
    }

    /// Returns the To recipients.
    pub fn to_addresses(&self) -> &[Address] {
        &self.to
    }

    /// Adds a Cc recipient.
    pub fn add_cc(&mut self, email: &str) -> EmailResult<&mut Self> {
        self.cc.push(Address::parse(email)?);
        Ok(self)
    }

    /// Adds a Cc recipient with a display name.
    pub fn add_cc_with_name(&mut self, email: &str, name: &str) -> EmailResult<&mut Self> {
        self.cc.push(Address::with_name(name, email)?);
        Ok(self)
    }

    /// Adds several Cc recipients; nothing is added if any is invalid.
    pub fn add_cc_many<I, S>(&mut self, emails: I) -> EmailResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_all(emails)?;
        self.cc.extend(addresses);
        Ok(self)
    }

    /// Replaces the Cc recipients.
    pub fn set_cc(&mut self, addresses: Vec<Address>) -> EmailResult<&mut Self> {
        self.cc = non_empty(addresses)?;
        Ok(self)
    }

    /// Returns the Cc recipients.
    pub fn cc_addresses(&self) -> &[Address] {
        &self.cc
    }

    /// Adds a Bcc recipient.
    pub fn add_bcc(&mut self, email: &str) -> EmailResult<&mut Self> {
        self.bcc.push(Address::parse(email)?);
        Ok(self)
    }

    /// Adds a Bcc recipient with a display name.
    pub fn add_bcc_with_name(&mut self, email: &str, name: &str) -> EmailResult<&mut Self> {
        self.bcc.push(Address::with_name(name, email)?);
        Ok(self)
    }

    /// Adds several Bcc recipients; nothing is added if any is invalid.
    pub fn add_bcc_many<I, S>(&mut self, emails: I) -> EmailResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = parse_all(emails)?;
        self.bcc.extend(addresses);
        Ok(self)
    }

    /// Replaces the Bcc recipients.
    pub fn set_bcc(&mut self, addresses: Vec<Address>) -> EmailResult<&mut Self> {
        self.bcc = non_empty(addresses)?;
        Ok(self)
    }

    /// Returns the Bcc recipients.
    pub fn bcc_addresses(&self) -> &[Address] {
        &self.bcc
    }

    /// Adds a reply-to address.
    pub fn add_reply_to(&mut self, email: &str) -> EmailResult<&mut Self> {
        self.reply_to.push(Address::parse(email)?);
        Ok(self)
    }

    /// Adds a reply-to address with a display name.
    pub fn add_reply_to_with_name(&mut self, email: &str, name: &str) -> EmailResult<&mut Self> {
        self.reply_to.push(Address::with_name(name, email)?);
        Ok(self)
    }

    /// Replaces the reply-to addresses.
    pub fn set_reply_to(&mut self, addresses: Vec<Address>) -> EmailResult<&mut Self> {
        self.reply_to = non_empty(addresses)?;
        Ok(self)
    }

    /// Returns the reply-to addresses.
    pub fn reply_to_addresses(&self) -> &[Address] {
        &self.reply_to
    }

    // Headers

    /// Adds a custom header, replacing any previous value for the name.
    pub fn add_header(&mut self, name: &str, value: &str) -> EmailResult<&mut Self> {
        validate_header(name, value)?;
        self.headers.insert(name.to_string(), value.to_string());
        Ok(self)
    }

    /// Replaces all custom headers; nothing changes if any entry is invalid.
    pub fn set_headers(&mut self, headers: HashMap<String, String>) -> EmailResult<&mut Self> {
        for (name, value) in &headers {
            validate_header(name, value)?;
        }
        self.headers = headers;
        Ok(self)
    }

    /// Returns the custom headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    // Build and send

    /// Returns true once the message has been built.
    pub fn is_built(&self) -> bool {
        matches!(self.state, BuildState::Built(_))
    }

    /// Returns the built message, if any.
    pub fn mime_message(&self) -> Option<&MimeMessage> {
        self.state.message()
    }

    /// Builds the message.
    ///
    /// Checks, in order: the draft is not built yet, a session can be
    /// resolved, a sender is available (explicitly or as the session's
    /// default sender), and at least one To recipient exists. Any failure
    /// leaves the draft unbuilt.
    pub fn build_mime_message(&mut self) -> EmailResult<&MimeMessage> {
        let timer = Timer::start("build_mime_message");
        let result = self.assemble();
        timer.stop();

        if let Some(metrics) = &self.metrics {
            metrics.record_build(result.is_ok());
        }

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "Failed to build MIME message");
                return Err(e);
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            to = self.to.len(),
            cc = self.cc.len(),
            bcc = self.bcc.len(),
            headers = self.headers.len(),
            message_id = message.message_id().unwrap_or_default(),
            "Built MIME message"
        );

        self.state = BuildState::Built(Box::new(message));
        self.state.message().ok_or_else(|| {
            EmailError::illegal_state(EmailErrorKind::NotBuilt, "The MimeMessage was not stored")
        })
    }

    fn assemble(&mut self) -> EmailResult<MimeMessage> {
        if self.is_built() {
            return Err(EmailError::illegal_state(
                EmailErrorKind::AlreadyBuilt,
                "The MimeMessage is already built",
            ));
        }

        let session = self.mail_session()?.clone();

        if self.from.is_none() && session.default_from().is_none() {
            return Err(EmailError::build(
                EmailErrorKind::MissingFrom,
                "From address required",
            ));
        }

        if self.to.is_empty() {
            return Err(EmailError::build(
                EmailErrorKind::MissingRecipients,
                "At least one To address required",
            ));
        }

        let mut message = self.factory.create_message(&session)?;

        if let Some(charset) = self.charset {
            message.set_charset(charset);
        }

        if let Some(from) = &self.from {
            message.set_from(from.clone());
        }

        message.set_recipients(RecipientType::To, self.to.clone());
        if !self.cc.is_empty() {
            message.set_recipients(RecipientType::Cc, self.cc.clone());
        }
        if !self.bcc.is_empty() {
            message.set_recipients(RecipientType::Bcc, self.bcc.clone());
        }
        if !self.reply_to.is_empty() {
            message.set_reply_to(self.reply_to.clone());
        }

        if let Some(subject) = self.subject.as_deref().filter(|s| !s.is_empty()) {
            message.set_subject(subject);
        }

        message.set_sent_date(self.sent_date());

        let content = self.content.clone().unwrap_or_else(|| Content::text(""));
        let content_type = self.resolve_content_type(&content)?;
        message.set_content(content.data, content_type);

        for (name, value) in &self.headers {
            message.add_header(name.as_str(), value.as_str());
        }

        let domain = self.from.as_ref().map_or("localhost", Address::domain);
        message.set_message_id(MimeEncoder::generate_message_id(domain));

        Ok(message)
    }

    /// Adds the draft charset to text types that do not declare one.
    fn resolve_content_type(&self, content: &Content) -> EmailResult<Mime> {
        if !content.is_text() || content.charset().is_some() {
            return Ok(content.mime.clone());
        }

        let charset = self
            .charset
            .unwrap_or(encoding_rs::UTF_8)
            .output_encoding()
            .name();
        let with_charset = format!("{}; charset={}", content.mime.as_ref(), charset);

        with_charset.parse::<Mime>().map_err(|e| {
            EmailError::new(
                EmailErrorKind::InvalidContentType,
                format!("Invalid content type: {}", with_charset),
            )
            .with_cause(e)
        })
    }

    /// Builds the message and hands it to the transport.
    ///
    /// Returns the message ID.
    pub async fn send(&mut self, transport: &dyn MailTransport) -> EmailResult<String> {
        self.build_mime_message()?;
        self.send_mime_message(transport).await
    }

    /// Hands the already built message to the transport.
    ///
    /// Returns the message ID.
    pub async fn send_mime_message(&self, transport: &dyn MailTransport) -> EmailResult<String> {
        let message = self.state.message().ok_or_else(|| {
            EmailError::illegal_state(
                EmailErrorKind::NotBuilt,
                "MimeMessage has not been created yet",
            )
        })?;

        let timer = Timer::start("send_mime_message");
        let result = transport.send(message).await;
        timer.stop();

        if let Some(metrics) = &self.metrics {
            metrics.record_send(result.is_ok());
        }

        if let Err(e) = result {
            let server = message.session().server_address();

            #[cfg(feature = "tracing")]
            tracing::warn!(server = %server, error = %e, "Failed to send MIME message");

            return Err(EmailError::transport(format!(
                "Sending the email to the following server failed : {}",
                server
            ))
            .with_cause(e));
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            server = %message.session().server_address(),
            recipients = message.all_recipients().count(),
            "Sent MIME message"
        );

        Ok(message.message_id().unwrap_or_default().to_string())
    }
}

fn parse_all<I, S>(emails: I) -> EmailResult<Vec<Address>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let addresses = emails
        .into_iter()
        .map(|e| Address::parse(e.as_ref()))
        .collect::<EmailResult<Vec<_>>>()?;
    non_empty(addresses)
}

fn non_empty(addresses: Vec<Address>) -> EmailResult<Vec<Address>> {
    if addresses.is_empty() {
        return Err(EmailError::new(
            EmailErrorKind::EmptyAddressList,
            "Address List provided was invalid",
        ));
    }
    Ok(addresses)
}

fn validate_header(name: &str, value: &str) -> EmailResult<()> {
    if name.is_empty() {
        return Err(EmailError::invalid_argument("name can not be null or empty"));
    }

    if value.is_empty() {
        return Err(EmailError::invalid_argument("value can not be null or empty"));
    }

    if name.chars().any(|c| c.is_control() || c.is_whitespace() || c == ':') {
        return Err(EmailError::new(
            EmailErrorKind::InvalidHeader,
            format!("Invalid header name: {:?}", name),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> Email {
        let mut email = Email::new();
        email
            .set_host_name(Some("smtp.example.com"))
            .unwrap()
            .set_from("sender@example.com")
            .unwrap()
            .add_to("recipient@example.com")
            .unwrap();
        email
    }

    #[test]
    fn test_add_many_is_all_or_nothing() {
        let mut email = Email::new();
        let err = email
            .add_bcc_many(["good@example.com", "", "also-good@example.com"])
            .unwrap_err();

        assert!(err.is_address_error());
        assert!(email.bcc_addresses().is_empty());

        let err = email.add_to_many(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.kind(), EmailErrorKind::EmptyAddressList);
    }

    #[test]
    fn test_set_headers_validates_first() {
        let mut email = Email::new();
        email.add_header("X-Keep", "kept").unwrap();

        let headers = HashMap::from([
            ("X-Good".to_string(), "ok".to_string()),
            ("X-Bad".to_string(), String::new()),
        ]);
        assert!(email.set_headers(headers).is_err());
        assert_eq!(email.headers().get("X-Keep").map(String::as_str), Some("kept"));
    }

    #[test]
    fn test_header_name_rejects_separator() {
        let err = Email::new().add_header("Bad: Name", "value").unwrap_err();
        assert_eq!(err.kind(), EmailErrorKind::InvalidHeader);
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_failed_build_leaves_draft_unbuilt() {
        let mut email = Email::new();
        email.set_host_name(Some("smtp.example.com")).unwrap();
        assert!(email.build_mime_message().is_err());
        assert!(!email.is_built());
        assert!(email.mime_message().is_none());

        email.set_from("sender@example.com").unwrap();
        email.add_to("recipient@example.com").unwrap();
        assert!(email.build_mime_message().is_ok());
        assert!(email.is_built());
    }

    #[test]
    fn test_charset_applied_to_text_content() {
        let mut email = ready();
        email.set_charset("ISO-8859-1").unwrap();
        email.set_content(Content::text("caf\u{e9}"));

        let message = email.build_mime_message().unwrap();
        let charset = message.content_type().get_param(mime::CHARSET).map(|c| c.as_str().to_string());
        assert_eq!(charset.as_deref(), Some("windows-1252"));
        assert_eq!(message.charset().name(), "windows-1252");
    }

    #[test]
    fn test_content_charset_becomes_draft_charset() {
        let mut email = Email::new();
        email.set_content(Content::new("x", "text/html; charset=utf-8").unwrap());
        assert_eq!(email.charset(), Some("UTF-8"));
    }

    #[test]
    fn test_charset_label_is_canonicalized() {
        let mut email = Email::new();
        for label in ["ISO-8859-1", "latin1", "us-ascii"] {
            email.set_charset(label).unwrap();
            assert_eq!(email.charset(), Some("windows-1252"));
        }

        email.set_charset("Shift_JIS").unwrap();
        assert_eq!(email.charset(), Some("Shift_JIS"));
    }

    #[test]
    fn test_unknown_charset() {
        let err = Email::new().set_charset("no-such-charset").unwrap_err();
        assert_eq!(err.kind(), EmailErrorKind::InvalidCharset);
    }

    #[test]
    fn test_set_msg_rejects_empty() {
        let mut email = Email::new();
        assert!(email.set_msg("").unwrap_err().is_invalid_argument());
        email.set_msg("hello").unwrap();
        assert_eq!(email.content().map(|c| c.data.as_str()), Some("hello"));
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(EmailMetrics::new());
        let mut email = ready().with_metrics(metrics.clone());

        email.build_mime_message().unwrap();
        assert!(email.build_mime_message().is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.builds_succeeded, 1);
        assert_eq!(snapshot.builds_failed, 1);
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let mut email = ready();
        let message = email.build_mime_message().unwrap();
        assert!(message.message_id().unwrap().ends_with("@example.com"));
    }
}
