//! Configuration types for the mail session.
//!
//! Provides session configuration with builder pattern for:
//! - Server host and ports
//! - TLS/SSL flags
//! - Authentication credentials
//! - Socket timeouts passed through to the transport

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::errors::{EmailError, EmailResult};

/// Default SMTP port.
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Default SMTP port for implicit TLS.
pub const DEFAULT_SSL_SMTP_PORT: u16 = 465;

/// Default socket read timeout.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(60);

/// Default socket connection timeout.
pub const DEFAULT_SOCKET_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport security derived from the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// No TLS.
    #[default]
    None,
    /// Opportunistic STARTTLS.
    StartTls,
    /// Required STARTTLS (fail if not supported).
    StartTlsRequired,
    /// Implicit TLS on connect.
    Implicit,
}

/// Mail session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// SMTP server hostname.
    #[serde(default)]
    pub host: Option<String>,
    /// SMTP server port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Port used when SSL on connect is enabled.
    #[serde(default = "default_ssl_smtp_port")]
    pub ssl_smtp_port: u16,
    /// Use implicit TLS on connect.
    #[serde(default)]
    pub ssl_on_connect: bool,
    /// Enable STARTTLS.
    #[serde(default)]
    pub start_tls_enabled: bool,
    /// Require STARTTLS.
    #[serde(default)]
    pub start_tls_required: bool,
    /// Check the server identity against its certificate.
    #[serde(default)]
    pub ssl_check_server_identity: bool,
    /// Send even if some recipients are rejected.
    #[serde(default)]
    pub send_partial: bool,
    /// Enable transport debug output.
    #[serde(default)]
    pub debug: bool,
    /// Return-path address for bounces.
    #[serde(default)]
    pub bounce_address: Option<String>,
    /// Authentication username.
    #[serde(default)]
    pub username: Option<String>,
    /// Authentication password (serialization skipped for security).
    #[serde(skip)]
    pub password: Option<SecretString>,
    /// Socket read timeout.
    #[serde(default = "default_socket_timeout", with = "humantime_serde")]
    pub socket_timeout: Duration,
    /// Socket connection timeout.
    #[serde(default = "default_socket_connection_timeout", with = "humantime_serde")]
    pub socket_connection_timeout: Duration,
}

fn default_smtp_port() -> u16 { DEFAULT_SMTP_PORT }
fn default_ssl_smtp_port() -> u16 { DEFAULT_SSL_SMTP_PORT }
fn default_socket_timeout() -> Duration { DEFAULT_SOCKET_TIMEOUT }
fn default_socket_connection_timeout() -> Duration { DEFAULT_SOCKET_CONNECTION_TIMEOUT }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: None,
            smtp_port: DEFAULT_SMTP_PORT,
            ssl_smtp_port: DEFAULT_SSL_SMTP_PORT,
            ssl_on_connect: false,
            start_tls_enabled: false,
            start_tls_required: false,
            ssl_check_server_identity: false,
            send_partial: false,
            debug: false,
            bounce_address: None,
            username: None,
            password: None,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            socket_connection_timeout: DEFAULT_SOCKET_CONNECTION_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EmailResult<()> {
        if self.host().is_none() {
            return Err(EmailError::configuration("Host is required"));
        }

        if self.smtp_port == 0 || self.ssl_smtp_port == 0 {
            return Err(EmailError::configuration("Ports must be non-zero"));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(EmailError::configuration(
                "username and password must be configured together",
            ));
        }

        Ok(())
    }

    /// Returns the host if it is set and non-empty.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref().filter(|h| !h.is_empty())
    }

    /// Returns the port the transport connects to.
    pub fn effective_port(&self) -> u16 {
        if self.ssl_on_connect {
            self.ssl_smtp_port
        } else {
            self.smtp_port
        }
    }

    /// Returns the full server address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host().unwrap_or_default(), self.effective_port())
    }

    /// Returns the configured credentials, if both parts are present.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::plain(username.clone(), password.expose_secret().clone()))
            }
            _ => None,
        }
    }

    /// Returns the transport security mode implied by the flags.
    pub fn tls_mode(&self) -> TlsMode {
        if self.ssl_on_connect {
            TlsMode::Implicit
        } else if self.start_tls_required {
            TlsMode::StartTlsRequired
        } else if self.start_tls_enabled {
            TlsMode::StartTls
        } else {
            TlsMode::None
        }
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Sets the SMTP server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Sets the SMTP server port.
    pub fn smtp_port(mut self, port: u16) -> Self {
        self.config.smtp_port = port;
        self
    }

    /// Sets the implicit TLS port.
    pub fn ssl_smtp_port(mut self, port: u16) -> Self {
        self.config.ssl_smtp_port = port;
        self
    }

    /// Sets plain credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(SecretString::new(password.into()));
        self
    }

    /// Sets the TLS mode.
    pub fn tls_mode(mut self, mode: TlsMode) -> Self {
        self.config.ssl_on_connect = mode == TlsMode::Implicit;
        self.config.start_tls_enabled = matches!(mode, TlsMode::StartTls | TlsMode::StartTlsRequired);
        self.config.start_tls_required = mode == TlsMode::StartTlsRequired;
        self
    }

    /// Sets whether the server identity is checked.
    pub fn ssl_check_server_identity(mut self, check: bool) -> Self {
        self.config.ssl_check_server_identity = check;
        self
    }

    /// Sets whether partial sends are allowed.
    pub fn send_partial(mut self, send_partial: bool) -> Self {
        self.config.send_partial = send_partial;
        self
    }

    /// Enables transport debug output.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Sets the bounce address.
    pub fn bounce_address(mut self, address: impl Into<String>) -> Self {
        self.config.bounce_address = Some(address.into());
        self
    }

    /// Sets the socket read timeout.
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.config.socket_timeout = timeout;
        self
    }

    /// Sets the socket connection timeout.
    pub fn socket_connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.socket_connection_timeout = timeout;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> EmailResult<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// Humantime serde support
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::builder()
            .host("smtp.example.com")
            .smtp_port(587)
            .credentials("user", "pass")
            .build()
            .unwrap();

        assert_eq!(config.host(), Some("smtp.example.com"));
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.username, Some("user".to_string()));
        assert!(config.credentials().is_some());
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::builder()
            .host("smtp.example.com")
            .build()
            .unwrap();

        assert_eq!(config.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(config.ssl_smtp_port, DEFAULT_SSL_SMTP_PORT);
        assert_eq!(config.socket_connection_timeout, DEFAULT_SOCKET_CONNECTION_TIMEOUT);
        assert_eq!(config.tls_mode(), TlsMode::None);
        assert_eq!(config.address(), "smtp.example.com:25");
    }

    #[test]
    fn test_config_validation() {
        assert!(SessionConfig::builder().build().is_err());
        assert!(SessionConfig::builder().host("").build().is_err());
        assert!(SessionConfig::builder()
            .host("smtp.example.com")
            .smtp_port(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_tls_mode_flags() {
        let config = SessionConfig::builder()
            .host("smtp.example.com")
            .tls_mode(TlsMode::Implicit)
            .build()
            .unwrap();
        assert!(config.ssl_on_connect);
        assert_eq!(config.effective_port(), DEFAULT_SSL_SMTP_PORT);

        let config = SessionConfig::builder()
            .host("smtp.example.com")
            .tls_mode(TlsMode::StartTlsRequired)
            .build()
            .unwrap();
        assert!(config.start_tls_enabled);
        assert!(config.start_tls_required);
        assert_eq!(config.tls_mode(), TlsMode::StartTlsRequired);
    }

    #[test]
    fn test_config_deserialize() {
        let config: SessionConfig = serde_json::from_str(
            r#"{
                "host": "smtp.example.com",
                "start_tls_enabled": true,
                "socket_connection_timeout": "30s"
            }"#,
        )
        .unwrap();

        assert_eq!(config.host(), Some("smtp.example.com"));
        assert_eq!(config.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(config.socket_connection_timeout, Duration::from_secs(30));
        assert_eq!(config.socket_timeout, DEFAULT_SOCKET_TIMEOUT);
        assert_eq!(config.tls_mode(), TlsMode::StartTls);
        assert!(config.password.is_none());
    }
}
