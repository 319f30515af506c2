//! Contact message model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::repository::{Draft, Record};
use crate::security::{validate_form, FieldRule, FormValidation};

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Record for ContactMessage {
    const STORE_KEY: &'static str = "contactMessages";
    const LABEL: &'static str = "Message";

    fn id(&self) -> i64 {
        self.id
    }

    fn touch(&mut self, _now: String) {}
}

/// Read-state filter for the admin message list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl MessageFilter {
    pub fn matches(&self, message: &ContactMessage) -> bool {
        match self {
            MessageFilter::All => true,
            MessageFilter::Unread => !message.read,
            MessageFilter::Read => message.read,
        }
    }
}

/// Contact form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Best-effort metadata about the submitting client.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// A contact submission together with its client metadata.
#[derive(Debug, Clone)]
pub struct ContactDraft {
    pub request: ContactRequest,
    pub client: ClientInfo,
}

const CONTACT_RULES: [(&str, FieldRule); 3] = [
    ("name", FieldRule::text().required().length(2, 100)),
    ("email", FieldRule::email().required()),
    ("message", FieldRule::text().required().length(10, 1000)),
];

impl ContactRequest {
    /// Sanitize and check every field, returning the cleaned values.
    pub fn validate(&self) -> Result<FormValidation, AppError> {
        let validation = validate_form(
            &[
                ("name", self.name.as_str()),
                ("email", self.email.as_str()),
                ("message", self.message.as_str()),
            ],
            &CONTACT_RULES,
        );

        if !validation.is_valid() {
            tracing::warn!(errors = ?validation.errors, "Contact form validation failed");
            return Err(AppError::Validation {
                message: "Please fill in the form correctly".to_string(),
                fields: Some(Value::Object(
                    validation
                        .errors
                        .into_iter()
                        .map(|(field, error)| (field, Value::String(error)))
                        .collect(),
                )),
            });
        }

        Ok(validation)
    }
}

impl Draft for ContactDraft {
    type Record = ContactMessage;

    fn build(self, id: i64, now: String) -> Result<ContactMessage, AppError> {
        let ContactDraft { request, client } = self;
        let validation = request.validate()?;

        Ok(ContactMessage {
            id,
            name: validation.value("name"),
            email: validation.value("email"),
            message: validation.value("message"),
            created_at: now,
            read: false,
            ip: client.ip,
            user_agent: client.user_agent,
        })
    }
}
