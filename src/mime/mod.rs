//! MIME encoding for built messages.
//!
//! Provides RFC 5322 compliant message formatting with:
//! - Header encoding (RFC 2047) in the message charset
//! - Header folding at 78 characters
//! - Quoted-printable text bodies and Base64 for everything else

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use uuid::Uuid;

use crate::errors::{EmailError, EmailErrorKind, EmailResult};
use crate::message::MimeMessage;
use crate::types::{Address, RecipientType};

/// Longest line RFC 5322 allows, excluding CRLF.
const MAX_LINE_LENGTH: usize = 998;

/// Longest word left unencoded; leaves room for the header name.
const MAX_WORD_LENGTH: usize = MAX_LINE_LENGTH - 78;

/// Longest RFC 2047 encoded-word.
const MAX_ENCODED_WORD_LENGTH: usize = 75;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII (no encoding).
    SevenBit,
    /// Quoted-printable encoding.
    #[default]
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl TransferEncoding {
    /// Returns the header value.
    pub fn header_value(&self) -> &'static str {
        match self {
            TransferEncoding::SevenBit => "7bit",
            TransferEncoding::QuotedPrintable => "quoted-printable",
            TransferEncoding::Base64 => "base64",
        }
    }
}

/// MIME encoder for built messages.
#[derive(Debug, Default)]
pub struct MimeEncoder;

impl MimeEncoder {
    /// Creates a new encoder.
    pub fn new() -> Self {
        Self
    }

    /// Encodes a message to RFC 5322 format.
    pub fn encode(&self, message: &MimeMessage) -> EmailResult<Vec<u8>> {
        let mut output = Vec::new();
        let charset = message.charset();

        let date = message.sent_date().unwrap_or_else(Utc::now);
        self.write_header(&mut output, "Date", &format_date(&date))?;

        if let Some(from) = message.from() {
            self.write_header(&mut output, "From", &self.encode_address(from, charset))?;
        }

        // Bcc is envelope-only and never rendered
        for kind in [RecipientType::To, RecipientType::Cc] {
            let recipients = message.recipients(kind);
            if !recipients.is_empty() {
                self.write_header(&mut output, kind.header_name(), &self.encode_address_list(recipients, charset))?;
            }
        }

        if !message.reply_to().is_empty() {
            self.write_header(&mut output, "Reply-To", &self.encode_address_list(message.reply_to(), charset))?;
        }

        if let Some(subject) = message.subject() {
            self.write_header(&mut output, "Subject", &self.encode_header(subject, charset))?;
        }

        if let Some(id) = message.message_id() {
            self.write_header(&mut output, "Message-ID", &format!("<{}>", id))?;
        }

        for (name, value) in message.headers() {
            self.write_header(&mut output, name, &self.encode_header(value, charset))?;
        }

        self.write_header(&mut output, "MIME-Version", "1.0")?;
        self.write_body(&mut output, message)?;

        Ok(output)
    }

    /// Writes a header line.
    fn write_header(&self, output: &mut Vec<u8>, name: &str, value: &str) -> EmailResult<()> {
        if name.is_empty() || name.chars().any(|c| c.is_control() || c.is_whitespace() || c == ':') {
            return Err(EmailError::new(
                EmailErrorKind::InvalidHeader,
                format!("Invalid header name: {:?}", name),
            ));
        }

        let header = format!("{}: {}", name, value);
        output.extend_from_slice(fold_header(&header).as_bytes());
        output.extend_from_slice(b"\r\n");
        Ok(())
    }

    /// Writes Content-Type, transfer encoding and the body.
    fn write_body(&self, output: &mut Vec<u8>, message: &MimeMessage) -> EmailResult<()> {
        let content_type = message.content_type();
        let is_text = content_type.type_() == mime::TEXT;

        // A charset parameter on the content type wins over the message charset
        let encoding = content_type
            .get_param(mime::CHARSET)
            .and_then(|c| Encoding::for_label(c.as_str().as_bytes()))
            .unwrap_or_else(|| message.charset());
        let (bytes, used) = encode_text(message.body(), encoding);

        // Relabel text that had to fall back to UTF-8
        if is_text && used != encoding {
            self.write_header(output, "Content-Type", &with_charset(content_type, used))?;
        } else {
            self.write_header(output, "Content-Type", content_type.as_ref())?;
        }

        if is_text && bytes.iter().all(|b| b.is_ascii() && *b != b'=') && !message.body().lines().any(|l| l.len() > MAX_LINE_LENGTH) {
            self.write_header(output, "Content-Transfer-Encoding", TransferEncoding::SevenBit.header_value())?;
            output.extend_from_slice(b"\r\n");
            output.extend_from_slice(&normalize_line_endings(&bytes));
        } else if is_text {
            self.write_header(output, "Content-Transfer-Encoding", TransferEncoding::QuotedPrintable.header_value())?;
            output.extend_from_slice(b"\r\n");
            output.extend_from_slice(&normalize_line_endings(&quoted_printable::encode(&bytes)));
        } else {
            self.write_header(output, "Content-Transfer-Encoding", TransferEncoding::Base64.header_value())?;
            output.extend_from_slice(b"\r\n");
            let encoded = BASE64.encode(&bytes);
            for chunk in encoded.as_bytes().chunks(76) {
                output.extend_from_slice(chunk);
                output.extend_from_slice(b"\r\n");
            }
        }

        Ok(())
    }

    /// Formats an address, encoding a non-ASCII display name.
    fn encode_address(&self, address: &Address, charset: &'static Encoding) -> String {
        match address.name() {
            Some(name) if needs_encoding(name) => {
                format!("{} <{}>", self.encode_header(name, charset), address.email())
            }
            _ => address.to_header(),
        }
    }

    fn encode_address_list(&self, addresses: &[Address], charset: &'static Encoding) -> String {
        addresses
            .iter()
            .map(|a| self.encode_address(a, charset))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Encodes a header value using RFC 2047.
    ///
    /// Values with non-ASCII or control characters, or with a word too long
    /// to fold onto one line, become a space-separated run of encoded-words
    /// of at most 75 characters each. Characters are never split across
    /// encoded-words. Values the charset cannot represent are encoded as
    /// UTF-8.
    fn encode_header(&self, value: &str, charset: &'static Encoding) -> String {
        if !needs_encoding(value) && !value.split(' ').any(|w| w.len() > MAX_WORD_LENGTH) {
            return value.to_string();
        }

        let (_, encoding) = encode_text(value, charset);
        let prefix = format!("=?{}?B?", encoding.name());
        let max_bytes = (MAX_ENCODED_WORD_LENGTH - prefix.len() - 2) / 4 * 3;

        let mut words = Vec::new();
        let mut chunk: Vec<u8> = Vec::with_capacity(max_bytes);
        let mut buf = [0u8; 4];

        for c in value.chars() {
            let (bytes, _, _) = encoding.encode(c.encode_utf8(&mut buf));
            if !chunk.is_empty() && chunk.len() + bytes.len() > max_bytes {
                words.push(format!("{}{}?=", prefix, BASE64.encode(&chunk)));
                chunk.clear();
            }
            chunk.extend_from_slice(&bytes);
        }

        if !chunk.is_empty() {
            words.push(format!("{}{}?=", prefix, BASE64.encode(&chunk)));
        }

        words.join(" ")
    }

    /// Generates a unique message ID for the given domain.
    pub fn generate_message_id(domain: &str) -> String {
        format!("{}.{}@{}", Uuid::new_v4().simple(), Utc::now().timestamp(), domain)
    }
}

/// Encodes text in the charset, or in UTF-8 when the charset cannot
/// represent every character. Returns the bytes and the encoding used.
fn encode_text<'a>(text: &'a str, charset: &'static Encoding) -> (Cow<'a, [u8]>, &'static Encoding) {
    let (bytes, used, had_errors) = charset.encode(text);
    if had_errors {
        (Cow::Borrowed(text.as_bytes()), encoding_rs::UTF_8)
    } else {
        (bytes, used)
    }
}

/// Renders a content type with its charset parameter replaced.
fn with_charset(content_type: &mime::Mime, charset: &'static Encoding) -> String {
    let mut value = content_type.essence_str().to_string();
    for (name, param) in content_type.params().filter(|(name, _)| *name != mime::CHARSET) {
        value.push_str(&format!("; {}={}", name, param));
    }
    value.push_str(&format!("; charset={}", charset.name()));
    value
}

fn needs_encoding(value: &str) -> bool {
    !value.chars().all(|c| c.is_ascii() && !c.is_control())
}

/// Formats the date for the Date header.
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// Folds a header line at 78 characters.
fn fold_header(header: &str) -> String {
    if header.len() <= 78 {
        return header.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in header.split(' ') {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= 76 {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            result.push_str(&current_line);
            result.push_str("\r\n ");
            current_line = word.to_string();
        }
    }

    result.push_str(&current_line);
    result
}

/// Converts bare LF line endings to CRLF.
fn normalize_line_endings(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() + 16);
    let mut prev = 0u8;

    for &byte in input {
        if byte == b'\n' && prev != b'\r' {
            output.push(b'\r');
        }
        output.push(byte);
        prev = byte;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{keys, MailSession, Properties};

    fn message() -> MimeMessage {
        let props: Properties = [(keys::MAIL_HOST, "smtp.example.com")].into_iter().collect();
        let mut message = MimeMessage::new(MailSession::new(props));
        message.set_from(Address::new("sender@example.com").unwrap());
        message.set_recipients(RecipientType::To, vec![Address::new("recipient@example.com").unwrap()]);
        message.set_recipients(RecipientType::Bcc, vec![Address::new("hidden@example.com").unwrap()]);
        message.set_subject("Test Subject");
        message.set_text("Hello World!");
        message.set_message_id("abc@example.com");
        message
    }

    #[test]
    fn test_header_encoding() {
        let encoder = MimeEncoder::new();

        assert_eq!(encoder.encode_header("Hello", encoding_rs::UTF_8), "Hello");

        let encoded = encoder.encode_header("Héllo", encoding_rs::UTF_8);
        assert!(encoded.starts_with("=?UTF-8?B?"));

        let encoded = encoder.encode_header("Héllo", encoding_rs::WINDOWS_1252);
        assert!(encoded.starts_with("=?windows-1252?B?"));
    }

    #[test]
    fn test_header_folding() {
        let long = format!("Subject: {}", "word ".repeat(30));
        let folded = fold_header(&long);
        assert!(folded.contains("\r\n "));
        assert!(folded.split("\r\n").all(|line| line.len() <= 78));
    }

    #[test]
    fn test_invalid_header_name() {
        let mut output = Vec::new();
        let err = MimeEncoder::new()
            .write_header(&mut output, "Bad:Name", "value")
            .unwrap_err();
        assert_eq!(err.kind(), EmailErrorKind::InvalidHeader);
        assert!(output.is_empty());
    }

    #[test]
    fn test_message_id_generation() {
        let id1 = MimeEncoder::generate_message_id("example.com");
        let id2 = MimeEncoder::generate_message_id("example.com");
        assert!(id1.ends_with("@example.com"));
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_simple_message_encoding() {
        let encoded = MimeEncoder::new().encode(&message()).unwrap();
        let content = String::from_utf8_lossy(&encoded);

        assert!(content.contains("From: sender@example.com\r\n"));
        assert!(content.contains("To: recipient@example.com\r\n"));
        assert!(content.contains("Subject: Test Subject\r\n"));
        assert!(content.contains("Message-ID: <abc@example.com>\r\n"));
        assert!(content.contains("MIME-Version: 1.0\r\n"));
        assert!(content.contains("Content-Type: text/plain\r\n"));
        assert!(content.ends_with("\r\n\r\nHello World!"));
        assert!(!content.contains("hidden@example.com"));
    }

    #[test]
    fn test_header_injection_is_encoded() {
        let mut message = message();
        message.add_header("X-Custom", "value\r\nBcc: evil@example.com");

        let encoded = MimeEncoder::new().encode(&message).unwrap();
        let content = String::from_utf8_lossy(&encoded);
        assert!(!content.contains("\r\nBcc: evil@example.com"));
        assert!(content.contains("X-Custom: =?UTF-8?B?"));
    }

    #[test]
    fn test_non_text_body_is_base64() {
        let mut message = message();
        message.set_content("{\"k\":1}", mime::APPLICATION_JSON);

        let encoded = MimeEncoder::new().encode(&message).unwrap();
        let content = String::from_utf8_lossy(&encoded);
        assert!(content.contains("Content-Transfer-Encoding: base64\r\n"));
        assert!(content.contains(&BASE64.encode("{\"k\":1}")));
    }

    #[test]
    fn test_long_header_values_are_split() {
        let mut message = message();
        message.set_subject("\u{e9}".repeat(600));
        message.add_header("X-Long", "a".repeat(2000));

        let encoded = MimeEncoder::new().encode(&message).unwrap();
        let content = String::from_utf8(encoded).unwrap();
        assert!(content.split("\r\n").all(|line| line.len() <= MAX_LINE_LENGTH));

        let words: Vec<&str> = content
            .split(|c: char| c.is_whitespace())
            .filter(|w| w.starts_with("=?UTF-8?B?"))
            .collect();
        assert!(words.len() > 2);
        assert!(words.iter().all(|w| w.len() <= MAX_ENCODED_WORD_LENGTH));

        // Every encoded-word decodes on its own
        let subject: String = content
            .split("\r\n")
            .skip_while(|line| !line.starts_with("Subject:"))
            .take_while(|line| line.starts_with("Subject:") || line.starts_with(' '))
            .flat_map(|line| line.split(' '))
            .filter_map(|w| w.strip_prefix("=?UTF-8?B?").and_then(|w| w.strip_suffix("?=")))
            .map(|payload| String::from_utf8(BASE64.decode(payload).unwrap()).unwrap())
            .collect();
        assert_eq!(subject, "\u{e9}".repeat(600));
    }

    #[test]
    fn test_unmappable_text_falls_back_to_utf8() {
        let mut message = message();
        message.set_charset(encoding_rs::WINDOWS_1252);
        message.set_subject("\u{65e5}\u{672c}");
        message.set_content(
            "\u{65e5}\u{672c}",
            "text/plain; charset=windows-1252".parse().unwrap(),
        );

        let encoded = MimeEncoder::new().encode(&message).unwrap();
        let content = String::from_utf8_lossy(&encoded);
        assert!(content.contains("Subject: =?UTF-8?B?5pel5pys?=\r\n"));
        assert!(content.contains("Content-Type: text/plain; charset=UTF-8\r\n"));
        assert!(content.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        assert!(content.contains("=E6=97=A5=E6=9C=AC"));
        assert!(!content.contains("&#"));
    }

    #[test]
    fn test_mappable_text_keeps_charset() {
        let mut message = message();
        message.set_charset(encoding_rs::WINDOWS_1252);
        message.set_subject("Caf\u{e9}");
        message.set_content("Caf\u{e9}", "text/plain; charset=windows-1252".parse().unwrap());

        let encoded = MimeEncoder::new().encode(&message).unwrap();
        let content = String::from_utf8_lossy(&encoded);
        assert!(content.contains("Subject: =?windows-1252?B?Q2Fm6Q==?=\r\n"));
        assert!(content.contains("Content-Type: text/plain; charset=windows-1252\r\n"));
        assert!(content.contains("Caf=E9"));
    }

    #[test]
    fn test_line_ending_normalization() {
        assert_eq!(normalize_line_endings(b"a\nb\r\nc"), b"a\r\nb\r\nc".to_vec());
    }
}
