//! Request validation.
//!
//! Requests deserialize into DTO structs whose named fields are the
//! allow-list; everything else in the body is ignored. The rules here run
//! before any store or token work and collect field-keyed messages in one
//! pass rather than failing on the first problem.

use crate::error::{ApiError, FieldMessages};

pub const NAME_MAX_LEN: usize = 100;
pub const TITLE_MAX_LEN: usize = 200;
pub const CONTENT_MAX_LEN: usize = 2000;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Accumulates field-keyed validation messages.
#[derive(Debug, Default)]
pub struct Validator {
    messages: FieldMessages,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.messages
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_ok(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.messages))
        }
    }

    pub fn check_name(&mut self, name: &str) {
        if name.trim().is_empty() {
            self.add("name", "can't be blank");
        } else if name.chars().count() > NAME_MAX_LEN {
            self.add("name", format!("is too long (maximum is {} characters)", NAME_MAX_LEN));
        }
    }

    pub fn check_email(&mut self, email: &str) {
        if email.trim().is_empty() {
            self.add("email", "can't be blank");
        } else if !email_shape_ok(email) {
            self.add("email", "is invalid");
        }
    }

    pub fn check_password(&mut self, password: &str, confirmation: &str) {
        if password.chars().count() < PASSWORD_MIN_LEN {
            self.add(
                "password",
                format!("is too short (minimum is {} characters)", PASSWORD_MIN_LEN),
            );
        }
        if password != confirmation {
            self.add("password_confirmation", "doesn't match password");
        }
    }

    pub fn check_title(&mut self, title: &str) {
        if title.trim().is_empty() {
            self.add("title", "can't be blank");
        } else if title.chars().count() > TITLE_MAX_LEN {
            self.add("title", format!("is too long (maximum is {} characters)", TITLE_MAX_LEN));
        }
    }

    pub fn check_content(&mut self, content: &str) {
        if content.chars().count() > CONTENT_MAX_LEN {
            self.add(
                "content",
                format!("is too long (maximum is {} characters)", CONTENT_MAX_LEN),
            );
        }
    }
}

/// Deliberately shallow email check: one `@` with a non-empty local part
/// and a dotted domain. Deliverability is the mail server's problem.
fn email_shape_ok(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.ends_with('+') {
        return false;
    }
    !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
