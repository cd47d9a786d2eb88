//! Contact form submission and the email it turns into.

use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::OutgoingEmail;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 30, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Message must be between 10 and 5000 characters"))]
    pub message: String,
    /// Hidden field; real visitors leave it empty.
    #[serde(default)]
    pub honeypot: Option<String>,
}

impl ContactForm {
    /// Runs field validation and folds every message into one error.
    pub fn check(&self) -> crate::Result<()> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            let messages: Vec<String> = fields
                .into_iter()
                .flat_map(|(field, list)| {
                    list.iter().map(move |e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("{field} is invalid"),
                    })
                })
                .collect();
            AppError::ValidationError(messages.join(", "))
        })
    }

    pub fn is_spam(&self) -> bool {
        self.honeypot
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn to_email(&self, to: &str, from: &str) -> OutgoingEmail {
        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("Not provided");

        OutgoingEmail {
            to: to.to_string(),
            from: from.to_string(),
            reply_to: Some(self.email.clone()),
            subject: format!("New Contact Form Submission from {}", self.name),
            body: format!(
                "New contact form submission from The Haymarket Woodshop website:\n\n\
                 Name: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}\n",
                self.name, self.email, phone, self.message
            ),
        }
    }
}
