//! Form validation for the login, registration and password-reset screens.
//!
//! Every check runs; callers get all failing fields at once so a form can mark
//! each of them.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::net::types::{RegistrationForm, UserType};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex"));
static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z '\-]*$").expect("valid name regex"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex"));

/// Failing fields in the order they were checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(())` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

// =============================================================================
// FIELD CHECKS
// =============================================================================

/// Check one email address. Returns the message to show, if any.
#[must_use]
pub fn email_error(email: &str) -> Option<&'static str> {
    let email = email.trim();
    if email.is_empty() {
        Some("Email is required.")
    } else if !EMAIL.is_match(email) {
        Some("Invalid email format.")
    } else {
        None
    }
}

fn password_error(password: &str) -> Option<&'static str> {
    if password.trim().is_empty() {
        Some("Password is required.")
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        Some("Password must be at least 6 characters.")
    } else {
        None
    }
}

fn phone_error(value: &str, required: &'static str, invalid: &'static str) -> Option<&'static str> {
    let value = value.trim();
    if value.is_empty() {
        Some(required)
    } else if !PHONE.is_match(value) {
        Some(invalid)
    } else {
        None
    }
}

fn date_error(date: &str) -> Option<&'static str> {
    let date = date.trim();
    if date.is_empty() {
        return Some("Date of Birth is required");
    }
    let Some(caps) = DATE.captures(date) else {
        return Some("Date of Birth must be YYYY-MM-DD");
    };
    let month: u32 = caps[2].parse().unwrap_or(0);
    let day: u32 = caps[3].parse().unwrap_or(0);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Some("Invalid Date of Birth");
    }
    None
}

// =============================================================================
// FORMS
// =============================================================================

/// Validate the login form.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(message) = email_error(email) {
        errors.push("email", message);
    }
    if let Some(message) = password_error(password) {
        errors.push("password", message);
    }
    errors.into_result()
}

/// Validate the self-registration form.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_registration(form: &RegistrationForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = form.name.trim();
    if name.is_empty() {
        errors.push("name", "Name is required");
    } else if !NAME.is_match(name) {
        errors.push("name", "Name may only contain letters, spaces, hyphens and apostrophes");
    }
    if let Some(message) = email_error(&form.email) {
        errors.push("email", message);
    }
    if let Some(message) = phone_error(&form.contact, "Contact is required", "Invalid contact number") {
        errors.push("contact", message);
    }
    if let Some(message) = password_error(&form.password) {
        errors.push("password", message);
    }
    if form.confirm_password.is_empty() {
        errors.push("confirmPassword", "Confirm Password is required");
    } else if form.confirm_password != form.password {
        errors.push("confirmPassword", "Passwords do not match");
    }
    match form.gender.trim().to_ascii_lowercase().as_str() {
        "" => errors.push("gender", "Gender is required"),
        "male" | "female" | "other" => {}
        _ => errors.push("gender", "Gender must be male, female or other"),
    }
    if let Some(message) = date_error(&form.date) {
        errors.push("date", message);
    }
    match UserType::known(form.user_type.trim()) {
        _ if form.user_type.trim().is_empty() => errors.push("userType", "User Type is required"),
        Some(UserType::Elder | UserType::Caretaker) => {}
        _ => errors.push("userType", "User Type must be Elder or Caretaker"),
    }
    if let Some(message) = phone_error(
        &form.emergency_contact,
        "Emergency Contact is required",
        "Invalid emergency contact number",
    ) {
        errors.push("emergencyContact", message);
    }

    errors.into_result()
}

/// Validate the reset-password form.
///
/// # Errors
///
/// Returns the failing field; a missing field is reported before a mismatch.
pub fn validate_reset(password: &str, confirm: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if password.is_empty() || confirm.is_empty() {
        errors.push("password", "Both fields are required.");
    } else if password != confirm {
        errors.push("confirmPassword", "Passwords do not match.");
    }
    errors.into_result()
}
