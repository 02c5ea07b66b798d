//! Email templates and drafts.
//!
//! Templates are stored like any other record. Delivery happens outside the
//! crate through an [`EmailSender`]; this module fills templates in and checks
//! a draft before it is handed over.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CrmError, Result};
use crate::model::{DEFAULT_TEMPLATE_CATEGORY, EmailTemplate};
use crate::repository::Repository;
use crate::utils::is_valid_email;

/// Placeholder in a template body replaced by the recipient's name.
pub const CONTACT_NAME_PLACEHOLDER: &str = "[Contact Name]";

/// Name used when the recipient has none.
pub const FALLBACK_RECIPIENT_NAME: &str = "there";

/// Fill in a template body for `recipient_name`.
///
/// Only the first `[Contact Name]` is replaced. A blank name becomes "there".
pub fn render_template(template: &EmailTemplate, recipient_name: &str) -> String {
    let name = match recipient_name.trim() {
        "" => FALLBACK_RECIPIENT_NAME,
        name => name,
    };
    template.body.replacen(CONTACT_NAME_PLACEHOLDER, name, 1)
}

/// A message ready to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub to: String,
    pub subject: String,
    pub message: String,
}

impl EmailDraft {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// A draft to `to` with the template's subject and rendered body.
    pub fn from_template(to: impl Into<String>, template: &EmailTemplate, recipient_name: &str) -> Self {
        Self::new(to, template.subject.clone(), render_template(template, recipient_name))
    }

    /// Check the draft can be sent.
    ///
    /// # Errors
    ///
    /// - [`CrmError::IncompleteEmail`] when the subject or message is blank
    /// - [`CrmError::InvalidRecipient`] when `to` is not an email address
    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() || self.message.trim().is_empty() {
            return Err(CrmError::IncompleteEmail);
        }
        if !is_valid_email(&self.to) {
            return Err(CrmError::InvalidRecipient(self.to.clone()));
        }
        Ok(())
    }
}

/// Delivers validated drafts.
pub trait EmailSender: Send + Sync {
    fn send(&self, draft: &EmailDraft) -> Result<()>;
}

/// Validate `draft` and pass it to `sender`. Nothing is sent when validation fails.
pub fn send_email(sender: &dyn EmailSender, draft: &EmailDraft) -> Result<()> {
    draft.validate()?;
    sender.send(draft)?;
    info!(to = draft.to.as_str(), "Email sent");
    Ok(())
}

/// Store a new template. A blank category is saved as "general".
pub fn create_template(repo: &dyn Repository<EmailTemplate>, mut template: EmailTemplate) -> Result<EmailTemplate> {
    if template.category.trim().is_empty() {
        template.category = DEFAULT_TEMPLATE_CATEGORY.to_string();
    }
    let created = repo.create(template)?;
    debug!(template_id = created.id, name = created.name.as_str(), "Email template created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    fn welcome() -> EmailTemplate {
        EmailTemplate::new(
            "Welcome",
            "Welcome aboard",
            "Hi [Contact Name],\n\nThanks for your time. [Contact Name] stays literal.",
        )
    }

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<EmailDraft>>,
    }

    impl EmailSender for Outbox {
        fn send(&self, draft: &EmailDraft) -> Result<()> {
            self.sent.lock().push(draft.clone());
            Ok(())
        }
    }

    #[test]
    fn test_render_replaces_first_placeholder() {
        assert_eq!(
            render_template(&welcome(), "Ada Lovelace"),
            "Hi Ada Lovelace,\n\nThanks for your time. [Contact Name] stays literal."
        );
    }

    #[test]
    fn test_render_without_name_greets_there() {
        assert!(render_template(&welcome(), "  ").starts_with("Hi there,"));
    }

    #[test]
    fn test_draft_from_template() {
        let draft = EmailDraft::from_template("ada@x.com", &welcome(), "Ada");
        assert_eq!(draft.subject, "Welcome aboard");
        assert!(draft.message.starts_with("Hi Ada,"));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields_and_bad_address() {
        let blank_subject = EmailDraft::new("ada@x.com", "  ", "hello");
        assert!(matches!(blank_subject.validate(), Err(CrmError::IncompleteEmail)));

        let blank_message = EmailDraft::new("ada@x.com", "Hi", "\n");
        assert!(matches!(blank_message.validate(), Err(CrmError::IncompleteEmail)));

        let bad_address = EmailDraft::new("ada at x", "Hi", "hello");
        assert!(matches!(
            bad_address.validate(),
            Err(CrmError::InvalidRecipient(ref to)) if to == "ada at x"
        ));
    }

    #[test]
    fn test_send_only_valid_drafts() {
        let outbox = Outbox::default();
        assert!(send_email(&outbox, &EmailDraft::new("nobody", "Hi", "hello")).is_err());
        send_email(&outbox, &EmailDraft::new("ada@x.com", "Hi", "hello")).unwrap();

        let sent = outbox.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@x.com");
    }

    #[test]
    fn test_create_template_defaults_category() {
        let repo: InMemoryRepository<EmailTemplate> = InMemoryRepository::new();
        let mut input = welcome();
        input.category = String::new();

        let created = create_template(&repo, input).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.category, DEFAULT_TEMPLATE_CATEGORY);

        let parsed: EmailTemplate =
            serde_json::from_str(r#"{"Id":4,"name":"Follow-up","subject":"Checking in","body":"Hi"}"#)
                .unwrap();
        assert_eq!(parsed.category, "general");
    }
}
