//! Wire DTOs for the CareHive backend.
//!
//! DESIGN
//! ======
//! Earlier front-ends read whatever shape a response happened to have. Here
//! every payload is parsed into one explicit type at the boundary, and a shape
//! mismatch is a typed `AuthError::Decode` instead of a silently missing field.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AuthError;

// =============================================================================
// USER
// =============================================================================

/// Account role. Unrecognized names are kept verbatim and match no role.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserType {
    Elder,
    Caretaker,
    Admin,
    Other(String),
}

impl UserType {
    /// Parse one of the three known roles; `None` for anything else.
    #[must_use]
    pub fn known(name: &str) -> Option<Self> {
        match name {
            "Elder" => Some(Self::Elder),
            "Caretaker" => Some(Self::Caretaker),
            "Admin" => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Elder => "Elder",
            Self::Caretaker => "Caretaker",
            Self::Admin => "Admin",
            Self::Other(name) => name,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for UserType {
    fn from(value: String) -> Self {
        Self::known(&value).unwrap_or(Self::Other(value))
    }
}

impl From<UserType> for String {
    fn from(value: UserType) -> Self {
        match value {
            UserType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated CareHive account as returned by login, refresh and
/// `/user/me`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier. Sent as a number by some endpoints and as a string
    /// by others; always held as a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub user_type: UserType,
    /// Remaining profile fields (contact, gender, date of birth, ...), kept so
    /// re-persisting a user never drops data.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>, user_type: UserType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            user_type,
            extra: serde_json::Map::new(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Ok(id),
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int.to_string());
            }
            if let Some(uint) = number.as_u64() {
                return Ok(uint.to_string());
            }
            Err(D::Error::custom(format!("id {number} is not an integer")))
        }
        other => Err(D::Error::custom(format!("expected string or integer id, got {other}"))),
    }
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

/// Body of a successful login: a user and the bearer token proving it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// Body of a successful refresh. The user is optional; when absent the
/// current user is kept.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RefreshPayload {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: User },
    Bare(User),
}

/// Error body used by the backend for rejected requests.
#[derive(Debug, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// Parse a login response.
///
/// # Errors
///
/// Returns `AuthError::Decode` if the body is not `{user, token}` or the token
/// is empty.
pub fn parse_auth_payload(body: &str) -> Result<AuthPayload, AuthError> {
    let payload: AuthPayload = serde_json::from_str(body).map_err(|e| AuthError::Decode(e.to_string()))?;
    require_token(&payload.token)?;
    Ok(payload)
}

/// Parse a refresh response.
///
/// # Errors
///
/// Returns `AuthError::Decode` if the body has no non-empty `token`.
pub fn parse_refresh_payload(body: &str) -> Result<RefreshPayload, AuthError> {
    let payload: RefreshPayload = serde_json::from_str(body).map_err(|e| AuthError::Decode(e.to_string()))?;
    require_token(&payload.token)?;
    Ok(payload)
}

/// Parse a "who am I" response, accepting a bare user or `{ "user": ... }`.
///
/// # Errors
///
/// Returns `AuthError::Decode` for any other shape.
pub fn parse_current_user(body: &str) -> Result<User, AuthError> {
    match serde_json::from_str::<UserEnvelope>(body) {
        Ok(UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user)) => Ok(user),
        Err(e) => Err(AuthError::Decode(format!("user payload: {e}"))),
    }
}

/// Extract the backend's `message` from an error body, if it has one.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiMessage>(body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.trim().is_empty())
}

fn require_token(token: &str) -> Result<(), AuthError> {
    if token.trim().is_empty() {
        return Err(AuthError::Decode("token is empty".to_owned()));
    }
    Ok(())
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-registration form as entered by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub password: String,
    pub confirm_password: String,
    pub gender: String,
    /// Date of birth as `YYYY-MM-DD`.
    pub date: String,
    pub user_type: String,
    pub emergency_contact: String,
}

impl RegistrationForm {
    /// JSON body for `POST /user/register`. The date of birth is sent as an
    /// ISO-8601 timestamp at UTC midnight and the confirmation is not sent.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name.trim(),
            "email": self.email.trim(),
            "contact": self.contact.trim(),
            "password": self.password,
            "gender": self.gender,
            "date": format!("{}T00:00:00.000Z", self.date.trim()),
            "userType": self.user_type,
            "emergencyContact": self.emergency_contact.trim(),
        })
    }
}
