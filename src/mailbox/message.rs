//! RFC 822 decoding: raw message bytes to HTML body + `Date:` header.

use mail_parser::{HeaderName, MessageParser, MessagePart, MimeHeaders};

/// A fetched message reduced to what the extractor consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Decoded body. The first `text/html` part, or the payload of a
    /// single-part message whatever its type. Empty when neither exists.
    pub body: String,
    /// `Date:` header as sent, whitespace-normalised. Empty when missing.
    pub header_date: String,
}

impl RawMessage {
    pub fn new(body: impl Into<String>, header_date: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            header_date: header_date.into(),
        }
    }

    /// Decode raw RFC 822 bytes. Bytes that do not parse as a message
    /// give an empty body and no date.
    pub fn from_rfc822(raw: &[u8]) -> Self {
        let Some(parsed) = MessageParser::default().parse(raw) else {
            return Self::default();
        };

        let header_date = parsed
            .header_raw(HeaderName::Date)
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let body = parsed
            .parts
            .iter()
            .find(|part| is_html(part))
            .map(part_text)
            .or_else(|| match parsed.parts.as_slice() {
                [single] => Some(part_text(single)),
                _ => None,
            })
            .unwrap_or_default();

        Self { body, header_date }
    }
}

fn is_html(part: &MessagePart<'_>) -> bool {
    MimeHeaders::content_type(part).is_some_and(|ct| {
        ct.ctype().eq_ignore_ascii_case("text")
            && ct.subtype().is_some_and(|s| s.eq_ignore_ascii_case("html"))
    })
}

fn part_text(part: &MessagePart<'_>) -> String {
    part.text_contents()
        .map(str::to_string)
        .unwrap_or_else(|| String::from_utf8_lossy(part.contents()).into_owned())
}
