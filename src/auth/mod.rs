//! Authentication credentials handed to the mail session.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Username and password for SMTP authentication.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Creates plain credentials.
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the protected password.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Returns true if both username and password are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_redacted() {
        let creds = Credentials::plain("username", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("username"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(creds.password().expose_secret(), "hunter2");
    }

    #[test]
    fn test_credentials_complete() {
        assert!(Credentials::plain("user", "pass").is_complete());
        assert!(!Credentials::plain("user", "").is_complete());
        assert!(!Credentials::plain("", "pass").is_complete());
    }
}
