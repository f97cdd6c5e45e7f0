//! Email delivery abstractions.
//!
//! Use cases render a strongly-typed [`EmailTemplate`] and hand it to an
//! [`EmailSender`]. The default sender for local dev is [`LogEmailSender`],
//! which logs the message and returns `Ok(())`.

use tracing::info;

use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Every email the service sends, with its template context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    ConfirmEmail { confirmation_link: String },
}

impl EmailTemplate {
    /// Template identifier
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::ConfirmEmail { .. } => "ConfirmEmail",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::ConfirmEmail { .. } => "Confirm your email",
        }
    }

    pub fn render_body(&self) -> String {
        match self {
            EmailTemplate::ConfirmEmail { confirmation_link } => format!(
                "Please confirm your account by following this link:\n\n{confirmation_link}\n"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub template: EmailTemplate,
}

impl EmailMessage {
    pub fn new(to: &Email, template: EmailTemplate) -> Self {
        Self {
            to_email: to.as_str().to_string(),
            template,
        }
    }
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    fn send(&self, message: &EmailMessage) -> AuthResult<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> AuthResult<()> {
        info!(
            to_email = %message.to_email,
            template = message.template.name(),
            subject = message.template.subject(),
            body = %message.template.render_body(),
            "email send stub"
        );
        Ok(())
    }
}
