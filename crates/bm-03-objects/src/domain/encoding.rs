//! Message text encodings

use std::fmt;

/// Encoding id carried in a msg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageEncoding {
    /// Body only (id 1).
    Trivial,
    /// `Subject:<subject>\nBody:<body>` (id 2).
    Simple,
}

impl MessageEncoding {
    /// Wire id.
    pub fn id(self) -> u64 {
        match self {
            Self::Trivial => 1,
            Self::Simple => 2,
        }
    }

    /// Known encodings; anything else is read as [`Trivial`](Self::Trivial).
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(Self::Trivial),
            2 => Some(Self::Simple),
            _ => None,
        }
    }
}

impl fmt::Display for MessageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Decoded message text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageText {
    /// Subject line (empty for trivial encoding).
    pub subject: String,
    /// Body text.
    pub body: String,
}

impl MessageText {
    /// Subject and body.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Serialize under `encoding`.
    pub fn encode(&self, encoding: MessageEncoding) -> Vec<u8> {
        match encoding {
            MessageEncoding::Trivial => self.body.as_bytes().to_vec(),
            MessageEncoding::Simple => {
                format!("Subject:{}\nBody:{}", self.subject, self.body).into_bytes()
            }
        }
    }

    /// Parse bytes carried under encoding id `encoding`.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn decode(encoding: u64, bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        match MessageEncoding::from_id(encoding) {
            Some(MessageEncoding::Simple) => decode_simple(&text),
            _ => Self::new("", text),
        }
    }
}

fn decode_simple(text: &str) -> MessageText {
    let Some(rest) = text.strip_prefix("Subject:") else {
        return MessageText::new("", text);
    };
    match rest.split_once("\nBody:") {
        Some((subject, body)) => MessageText::new(subject, body),
        None => MessageText::new(rest, ""),
    }
}
