//! Mail session resolution.
//!
//! A [`MailSession`] is a property map plus optional credentials. It is the
//! only thing the message factory and the transport get to see of the
//! configuration. Building one never touches the network.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::auth::Credentials;
use crate::config::{SessionConfig, TlsMode};
use crate::errors::{EmailError, EmailErrorKind, EmailResult};

/// Well-known session property names.
pub mod keys {
    /// Transport protocol.
    pub const MAIL_TRANSPORT_PROTOCOL: &str = "mail.transport.protocol";
    /// SMTP host.
    pub const MAIL_HOST: &str = "mail.smtp.host";
    /// SMTP port.
    pub const MAIL_PORT: &str = "mail.smtp.port";
    /// Debug output.
    pub const MAIL_DEBUG: &str = "mail.debug";
    /// Whether to authenticate.
    pub const MAIL_SMTP_AUTH: &str = "mail.smtp.auth";
    /// Authentication user.
    pub const MAIL_SMTP_USER: &str = "mail.smtp.user";
    /// Authentication password.
    pub const MAIL_SMTP_PASSWORD: &str = "mail.smtp.password";
    /// Enable STARTTLS.
    pub const MAIL_TRANSPORT_STARTTLS_ENABLE: &str = "mail.smtp.starttls.enable";
    /// Require STARTTLS.
    pub const MAIL_TRANSPORT_STARTTLS_REQUIRED: &str = "mail.smtp.starttls.required";
    /// Send even if some recipients are invalid.
    pub const MAIL_SMTP_SEND_PARTIAL: &str = "mail.smtp.sendpartial";
    /// Implicit TLS.
    pub const MAIL_SMTP_SSL_ENABLE: &str = "mail.smtp.ssl.enable";
    /// Port for the TLS socket.
    pub const MAIL_SMTP_SOCKET_FACTORY_PORT: &str = "mail.smtp.socketFactory.port";
    /// Verify the server identity.
    pub const MAIL_SMTP_SSL_CHECKSERVERIDENTITY: &str = "mail.smtp.ssl.checkserveridentity";
    /// Envelope sender (bounce address).
    pub const MAIL_SMTP_FROM: &str = "mail.smtp.from";
    /// Default sender.
    pub const MAIL_FROM: &str = "mail.from";
    /// Socket read timeout in milliseconds.
    pub const MAIL_SMTP_TIMEOUT: &str = "mail.smtp.timeout";
    /// Socket connection timeout in milliseconds.
    pub const MAIL_SMTP_CONNECTIONTIMEOUT: &str = "mail.smtp.connectiontimeout";

    /// Protocol name for SMTP.
    pub const SMTP: &str = "smtp";
}

/// Ordered session property map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    /// Creates an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets a property value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Removes a property.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Returns true if the property is set to "true" (case-insensitive).
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key).map_or(false, |v| v.eq_ignore_ascii_case("true"))
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no properties are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Resolved mail session.
#[derive(Debug, Clone, Default)]
pub struct MailSession {
    properties: Properties,
    credentials: Option<Credentials>,
}

impl MailSession {
    /// Creates a session from raw properties.
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            credentials: None,
        }
    }

    /// Attaches credentials to the session.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Maps a configuration onto session properties.
    ///
    /// Fails if the configuration has no host.
    pub fn from_config(config: &SessionConfig) -> EmailResult<Self> {
        let host = config.host().ok_or_else(|| {
            EmailError::build(
                EmailErrorKind::MissingHost,
                "Cannot find valid hostname for mail session",
            )
        })?;

        let credentials = config.credentials();
        let mut props = Properties::new();

        props
            .set(keys::MAIL_TRANSPORT_PROTOCOL, keys::SMTP)
            .set(keys::MAIL_PORT, config.smtp_port.to_string())
            .set(keys::MAIL_HOST, host)
            .set(keys::MAIL_DEBUG, config.debug.to_string())
            .set(keys::MAIL_TRANSPORT_STARTTLS_ENABLE, config.start_tls_enabled.to_string())
            .set(keys::MAIL_TRANSPORT_STARTTLS_REQUIRED, config.start_tls_required.to_string())
            .set(keys::MAIL_SMTP_SEND_PARTIAL, config.send_partial.to_string());

        if credentials.is_some() {
            props.set(keys::MAIL_SMTP_AUTH, "true");
        }

        if config.ssl_on_connect {
            let port = config.ssl_smtp_port.to_string();
            props
                .set(keys::MAIL_PORT, port.clone())
                .set(keys::MAIL_SMTP_SOCKET_FACTORY_PORT, port)
                .set(keys::MAIL_SMTP_SSL_ENABLE, "true");
        }

        if (config.ssl_on_connect || config.start_tls_enabled) && config.ssl_check_server_identity {
            props.set(keys::MAIL_SMTP_SSL_CHECKSERVERIDENTITY, "true");
        }

        if let Some(bounce) = &config.bounce_address {
            props.set(keys::MAIL_SMTP_FROM, bounce.clone());
        }

        if !config.socket_timeout.is_zero() {
            props.set(keys::MAIL_SMTP_TIMEOUT, config.socket_timeout.as_millis().to_string());
        }

        if !config.socket_connection_timeout.is_zero() {
            props.set(
                keys::MAIL_SMTP_CONNECTIONTIMEOUT,
                config.socket_connection_timeout.as_millis().to_string(),
            );
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            host = %host,
            port = %props.get(keys::MAIL_PORT).unwrap_or_default(),
            auth = credentials.is_some(),
            "Resolved mail session"
        );

        Ok(Self {
            properties: props,
            credentials,
        })
    }

    /// Returns the session properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns a single property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Returns the session credentials.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the SMTP host.
    pub fn host(&self) -> Option<&str> {
        self.property(keys::MAIL_HOST).filter(|h| !h.is_empty())
    }

    /// Returns the SMTP port, if set and numeric.
    pub fn port(&self) -> Option<u16> {
        self.property(keys::MAIL_PORT).and_then(|p| p.parse().ok())
    }

    /// Returns the default sender carried by the session, if any.
    pub fn default_from(&self) -> Option<&str> {
        self.property(keys::MAIL_SMTP_FROM)
            .or_else(|| self.property(keys::MAIL_FROM))
            .filter(|f| !f.is_empty())
    }

    /// Returns the socket connection timeout.
    pub fn connection_timeout(&self) -> Option<Duration> {
        self.property(keys::MAIL_SMTP_CONNECTIONTIMEOUT)
            .and_then(|t| t.parse().ok())
            .map(Duration::from_millis)
    }

    /// Returns the socket read timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.property(keys::MAIL_SMTP_TIMEOUT)
            .and_then(|t| t.parse().ok())
            .map(Duration::from_millis)
    }

    /// Returns the transport security mode implied by the properties.
    pub fn tls_mode(&self) -> TlsMode {
        if self.properties.is_true(keys::MAIL_SMTP_SSL_ENABLE) {
            TlsMode::Implicit
        } else if self.properties.is_true(keys::MAIL_TRANSPORT_STARTTLS_REQUIRED) {
            TlsMode::StartTlsRequired
        } else if self.properties.is_true(keys::MAIL_TRANSPORT_STARTTLS_ENABLE) {
            TlsMode::StartTls
        } else {
            TlsMode::None
        }
    }

    /// Returns `host:port` for diagnostics.
    pub fn server_address(&self) -> String {
        format!(
            "{}:{}",
            self.host().unwrap_or("<unknown>"),
            self.property(keys::MAIL_PORT).unwrap_or("<unknown>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SessionConfig {
        SessionConfig {
            host: Some("smtp.example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_session_from_config() {
        let session = MailSession::from_config(&base_config()).unwrap();

        assert_eq!(session.host(), Some("smtp.example.com"));
        assert_eq!(session.port(), Some(25));
        assert_eq!(session.property(keys::MAIL_TRANSPORT_PROTOCOL), Some("smtp"));
        assert_eq!(session.property(keys::MAIL_DEBUG), Some("false"));
        assert_eq!(session.property(keys::MAIL_SMTP_AUTH), None);
        assert_eq!(session.property(keys::MAIL_SMTP_SSL_CHECKSERVERIDENTITY), None);
        assert_eq!(session.connection_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(session.tls_mode(), TlsMode::None);
        assert!(session.credentials().is_none());
    }

    #[test]
    fn test_session_missing_host() {
        let err = MailSession::from_config(&SessionConfig::default()).unwrap_err();
        assert_eq!(err.kind(), EmailErrorKind::MissingHost);

        let config = SessionConfig {
            host: Some(String::new()),
            ..Default::default()
        };
        assert!(MailSession::from_config(&config).unwrap_err().is_build_error());
    }

    #[test]
    fn test_session_ssl_and_auth() {
        let mut config = base_config();
        config.ssl_on_connect = true;
        config.start_tls_enabled = true;
        config.ssl_check_server_identity = true;
        config.username = Some("username".to_string());
        config.password = Some(secrecy::SecretString::new("password".to_string()));
        config.bounce_address = Some("bounce@example.com".to_string());

        let session = MailSession::from_config(&config).unwrap();

        assert_eq!(session.port(), Some(465));
        assert_eq!(session.property(keys::MAIL_SMTP_SOCKET_FACTORY_PORT), Some("465"));
        assert_eq!(session.property(keys::MAIL_SMTP_AUTH), Some("true"));
        assert_eq!(session.property(keys::MAIL_SMTP_SSL_CHECKSERVERIDENTITY), Some("true"));
        assert_eq!(session.default_from(), Some("bounce@example.com"));
        assert_eq!(session.tls_mode(), TlsMode::Implicit);
        assert_eq!(session.credentials().map(|c| c.username()), Some("username"));
    }

    #[test]
    fn test_session_zero_timeouts_omitted() {
        let mut config = base_config();
        config.socket_timeout = Duration::ZERO;
        config.socket_connection_timeout = Duration::ZERO;

        let session = MailSession::from_config(&config).unwrap();
        assert!(session.timeout().is_none());
        assert!(session.connection_timeout().is_none());
    }

    #[test]
    fn test_session_from_raw_properties() {
        let props: Properties = [(keys::MAIL_HOST, "Insomnia.host")].into_iter().collect();
        let session = MailSession::new(props);

        assert_eq!(session.host(), Some("Insomnia.host"));
        assert_eq!(session.port(), None);
        assert_eq!(session.server_address(), "Insomnia.host:<unknown>");
    }
}
