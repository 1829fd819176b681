//! Email request and result types

use super::sender::Sender;
use crate::error::SendError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// Parse either `Name <addr>` or a bare address.
    ///
    /// Anything that does not look like the mailbox form is kept verbatim as
    /// the address; checking deliverability is the provider's job.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let (Some(open), true) = (input.rfind('<'), input.ends_with('>')) {
            let email = input[open + 1..input.len() - 1].trim();
            let name = input[..open].trim().trim_matches('"').trim();
            if !email.is_empty() {
                return if name.is_empty() {
                    Self::new(email)
                } else {
                    Self::with_name(email, name)
                };
            }
        }
        Self::new(input)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl From<&str> for EmailAddress {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for EmailAddress {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&String> for EmailAddress {
    fn from(value: &String) -> Self {
        Self::parse(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.to_string()
    }
}

/// One or more addresses for a `to`, `cc`, `bcc` or `reply-to` field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct Recipients(Vec<EmailAddress>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(EmailAddress),
    Many(Vec<EmailAddress>),
}

impl From<OneOrMany> for Recipients {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(addr) => Self(vec![addr]),
            OneOrMany::Many(addrs) => Self(addrs),
        }
    }
}

impl Recipients {
    pub fn iter(&self) -> std::slice::Iter<'_, EmailAddress> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[EmailAddress] {
        &self.0
    }

    /// Addresses rendered in `Name <addr>` form
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a EmailAddress;
    type IntoIter = std::slice::Iter<'a, EmailAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<EmailAddress> for Recipients {
    fn from(value: EmailAddress) -> Self {
        Self(vec![value])
    }
}

impl From<&str> for Recipients {
    fn from(value: &str) -> Self {
        Self(vec![value.into()])
    }
}

impl From<String> for Recipients {
    fn from(value: String) -> Self {
        Self(vec![value.into()])
    }
}

impl<T: Into<EmailAddress>> From<Vec<T>> for Recipients {
    fn from(value: Vec<T>) -> Self {
        Self(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<EmailAddress>, const N: usize> From<[T; N]> for Recipients {
    fn from(value: [T; N]) -> Self {
        Self(value.into_iter().map(Into::into).collect())
    }
}

/// File attached to an email; the content is passed to the provider as raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A send request as issued by callers.
///
/// `provider` and `from` hold ids of registered providers and senders; when
/// left unset the mailer picks the `"default"` entry, or the first one
/// registered if there is no such id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailRequest {
    pub provider: Option<String>,
    pub from: Option<String>,
    pub to: Recipients,
    pub cc: Option<Recipients>,
    pub bcc: Option<Recipients>,
    pub reply_to: Option<Recipients>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub attachments: Vec<Attachment>,
}

impl EmailRequest {
    pub fn new(
        to: impl Into<Recipients>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            ..Default::default()
        }
    }

    pub fn with_text_body(mut self, text_body: impl Into<String>) -> Self {
        self.text_body = Some(text_body.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_from(mut self, sender: impl Into<String>) -> Self {
        self.from = Some(sender.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<Recipients>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn with_bcc(mut self, bcc: impl Into<Recipients>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<Recipients>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Set a header, replacing any previous value under the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// Normalized request handed to a provider transport, with the sender resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub sender: Sender,
    pub to: Recipients,
    pub cc: Option<Recipients>,
    pub bcc: Option<Recipients>,
    pub reply_to: Option<Recipients>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Always empty for providers that do not support attachments
    pub attachments: Vec<Attachment>,
}

impl OutgoingEmail {
    pub(crate) fn from_request(sender: Sender, request: EmailRequest) -> Self {
        Self {
            sender,
            to: request.to,
            cc: request.cc,
            bcc: request.bcc,
            reply_to: request.reply_to,
            subject: request.subject,
            html_body: request.html_body,
            text_body: request.text_body,
            headers: request.headers,
            attachments: request.attachments,
        }
    }

    /// Total number of addressed recipients across to, cc and bcc
    pub fn recipient_count(&self) -> usize {
        self.to.len()
            + self.cc.as_ref().map_or(0, Recipients::len)
            + self.bcc.as_ref().map_or(0, Recipients::len)
    }
}

/// Result returned by safe-mode mailers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendOutcome {
    Success,
    Failure { error: SendError },
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn error(&self) -> Option<&SendError> {
        match self {
            Self::Success => None,
            Self::Failure { error } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<(), SendError> {
        self.into()
    }
}

impl From<Result<(), SendError>> for SendOutcome {
    fn from(result: Result<(), SendError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(error) => Self::Failure { error },
        }
    }
}

impl From<SendOutcome> for Result<(), SendError> {
    fn from(outcome: SendOutcome) -> Self {
        match outcome {
            SendOutcome::Success => Ok(()),
            SendOutcome::Failure { error } => Err(error),
        }
    }
}
