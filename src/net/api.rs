//! REST API helpers for the CareHive backend.
//!
//! `ApiClient` is the only HTTP entry point callers should use. Authenticated
//! verbs go through `SessionManager::send_authorized`, so every call carries
//! the current bearer token and gets the refresh-once protocol. The account
//! endpoints (login, register, password reset) are sent without credentials.
//!
//! ERROR HANDLING
//! ==============
//! Form input is validated before any request is made and reported as
//! `AuthError::Validation`. Rejected credentials become
//! `AuthError::Credentials` carrying the backend's message.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::{ApiRequest, ApiResponse, Method};
use super::types::{LoginRequest, RegistrationForm, User, error_message, parse_auth_payload, parse_current_user};
use crate::error::AuthError;
use crate::state::manager::SessionManager;
use crate::util::validate::{self, FieldErrors};

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

fn credentials_message(body: &str) -> String {
    error_message(body).unwrap_or_else(|| LOGIN_FAILED.to_owned())
}

fn is_credentials_rejection(status: u16) -> bool {
    matches!(status, 400 | 401 | 403)
}

#[derive(Clone)]
pub struct ApiClient {
    session: SessionManager,
}

impl ApiClient {
    #[must_use]
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // =========================================================================
    // AUTHENTICATED VERBS
    // =========================================================================

    /// Send an arbitrary request with interception.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`].
    pub async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.session.send_authorized(request).await
    }

    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, AuthError> {
        self.request(&ApiRequest::get(path)).await
    }

    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`].
    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, AuthError> {
        self.request(&ApiRequest::post(path).with_json(body)).await
    }

    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`].
    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, AuthError> {
        self.request(&ApiRequest::new(Method::Put, path).with_json(body)).await
    }

    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`].
    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse, AuthError> {
        self.request(&ApiRequest::new(Method::Patch, path).with_json(body)).await
    }

    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`].
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, AuthError> {
        self.request(&ApiRequest::new(Method::Delete, path)).await
    }

    /// GET `path` and decode the body as `T`.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::send_authorized`], plus `AuthError::Decode`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        self.get(path).await?.json()
    }

    /// Re-read the logged-in user from the backend and cache it.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::reconcile_user`].
    pub async fn fetch_current_user(&self) -> Result<User, AuthError> {
        self.session.reconcile_user().await
    }

    // =========================================================================
    // ACCOUNT ENDPOINTS
    // =========================================================================

    /// Log in with email and password and establish the session.
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` for malformed input (no request is sent).
    /// - `AuthError::Credentials` when the backend rejects the credentials.
    /// - `AuthError::Decode` when the success body is not `{user, token}`.
    /// - `AuthError::Storage` when the session cannot be persisted.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        validate::validate_login(email, password).map_err(AuthError::Validation)?;

        let body = serde_json::to_value(LoginRequest { email: email.trim().to_owned(), password: password.to_owned() })
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        let endpoint = &self.session.config().endpoints.login;
        let response = self
            .session
            .send_public(&ApiRequest::post(endpoint.as_str()).with_json(body))
            .await?;
        if is_credentials_rejection(response.status) {
            tracing::warn!(status = response.status, "login rejected");
            return Err(AuthError::Credentials(credentials_message(&response.body)));
        }

        let payload = parse_auth_payload(&response.error_for_status()?.body)?;
        self.session.login(payload.user.clone(), payload.token)?;
        Ok(payload.user)
    }

    /// Create an Elder or Caretaker account. Does not log in.
    ///
    /// # Errors
    ///
    /// `AuthError::Validation` for malformed input, `AuthError::Status` when
    /// the backend refuses, `AuthError::Decode` for an unexpected body.
    pub async fn register(&self, form: &RegistrationForm) -> Result<User, AuthError> {
        validate::validate_registration(form).map_err(AuthError::Validation)?;

        let endpoint = &self.session.config().endpoints.register;
        let request = ApiRequest::post(endpoint.as_str()).with_json(form.to_payload());
        let response = self.session.send_public(&request).await?.error_for_status()?;
        let user = parse_current_user(&response.body)?;
        tracing::info!(user_id = %user.id, user_type = %user.user_type, "registered");
        Ok(user)
    }

    /// Ask the backend to email a password-reset link.
    ///
    /// # Errors
    ///
    /// `AuthError::Validation` for a malformed email, otherwise any send or
    /// status failure.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        if let Some(message) = validate::email_error(email) {
            let mut errors = FieldErrors::new();
            errors.push("email", message);
            return Err(AuthError::Validation(errors));
        }

        let endpoint = &self.session.config().endpoints.forgot_password;
        let request = ApiRequest::post(endpoint.as_str()).with_json(serde_json::json!({ "email": email.trim() }));
        self.session.send_public(&request).await?.error_for_status()?;
        Ok(())
    }

    /// Set a new password using the token from a reset link. The password is
    /// sent as a bare JSON string.
    ///
    /// # Errors
    ///
    /// `AuthError::Validation` for a missing token or mismatched passwords,
    /// `AuthError::Status` for an invalid or expired token.
    pub async fn reset_password(&self, token: &str, password: &str, confirm: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            let mut errors = FieldErrors::new();
            errors.push("token", "Invalid or missing reset token.");
            return Err(AuthError::Validation(errors));
        }
        validate::validate_reset(password, confirm).map_err(AuthError::Validation)?;

        let endpoint = &self.session.config().endpoints.reset_password;
        let request = ApiRequest::post(endpoint.as_str())
            .with_query("token", token)
            .with_json(Value::String(password.to_owned()));
        self.session.send_public(&request).await?.error_for_status()?;
        tracing::info!("password reset");
        Ok(())
    }
}
