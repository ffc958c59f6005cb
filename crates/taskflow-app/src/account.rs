//! Account endpoints: registration, login, session restore and profile management.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use taskflow_core::ValidationError;
use taskflow_core::draft::require_field;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::http::{ApiClient, Auth, ensure_success};
use crate::session::{Session, SessionContext};

const REGISTER_PATH: &str = "/user/register";
const LOGIN_PATH: &str = "/user/login";
const ME_PATH: &str = "/user/me";
const PROFILE_PATH: &str = "/user/profile";
const PASSWORD_PATH: &str = "/user/password";

const REGISTER_FAILED: &str = "An error occurred. Please try again.";
const LOGIN_FAILED: &str = "Login failed";
const PROFILE_LOAD_FAILED: &str = "Unable to load profile.";
const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
const PASSWORD_FAILED: &str = "Password change failed";

/// User record as returned by `/user/me` and `/user/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    /// Server id (`id` or `_id`), empty when absent.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl UserProfile {
    fn from_value(user: Option<&Value>) -> Self {
        let field = |key: &str| {
            user.and_then(|user| user.get(key))
                .and_then(|value| match value {
                    Value::String(text) => Some(text.clone()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                })
        };
        Self {
            id: field("id").or_else(|| field("_id")).unwrap_or_default(),
            name: field("name").unwrap_or_default(),
            email: field("email").unwrap_or_default(),
        }
    }
}

/// Account operations bound to one session context.
#[derive(Debug, Clone)]
pub struct AccountService {
    client: ApiClient,
}

impl AccountService {
    /// Service sharing `client`'s session.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn session(&self) -> &Arc<SessionContext> {
        self.client.session()
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    /// Returns a validation error for blank fields, [`ApiError::Rejected`]
    /// when the server answers `success: false`, or the transport error.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        require_field("Name", name)?;
        require_field("Email", email)?;
        require_field("Password", password)?;
        let body = self
            .client
            .post(
                REGISTER_PATH,
                &json!({ "name": name, "email": email, "password": password }),
                Auth::None,
                REGISTER_FAILED,
            )
            .await?;
        ensure_success(&body, REGISTER_FAILED)?;
        info!(email, "account registered");
        Ok(())
    }

    /// Sign in and install the session, persisting it when `remember` is set.
    ///
    /// # Errors
    /// Returns a validation error for blank fields, [`ApiError::Rejected`]
    /// when the response carries no token, or the transport error.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, ApiError> {
        require_field("Email", email)?;
        require_field("Password", password)?;
        let body = self
            .client
            .post(
                LOGIN_PATH,
                &json!({ "email": email, "password": password }),
                Auth::None,
                LOGIN_FAILED,
            )
            .await?;

        let Some(token) = body
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
        else {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(LOGIN_FAILED);
            return Err(ApiError::Rejected(message.to_owned()));
        };

        let user = UserProfile::from_value(body.get("user"));
        let email = if user.email.is_empty() { email } else { user.email.as_str() };
        let session = Session::new(token, user.id.clone(), &user.name, email);
        self.session().establish(session.clone(), remember)?;
        Ok(session)
    }

    /// Resume a remembered session after confirming the token with the server.
    ///
    /// Returns `None` when nothing is stored. The stored session becomes
    /// active only after `/user/me` accepts it. A rejected token clears the
    /// stored keys; any other failure keeps them for the next attempt.
    ///
    /// # Errors
    /// Returns the error that prevented confirmation.
    pub async fn restore(&self) -> Result<Option<Session>, ApiError> {
        let Some(stored) = self.session().stored()? else {
            return Ok(None);
        };
        let body = match self
            .client
            .get(ME_PATH, Auth::Bearer(&stored.token), PROFILE_LOAD_FAILED)
            .await
        {
            Ok(body) => body,
            Err(err) => {
                if !err.is_auth() {
                    warn!(error = %err, "could not confirm stored session");
                }
                return Err(err);
            }
        };
        if let Err(err) = ensure_success(&body, PROFILE_LOAD_FAILED) {
            self.session().invalidate();
            return Err(err);
        }

        let user = UserProfile::from_value(body.get("user"));
        let user_id = if user.id.is_empty() { stored.user_id } else { user.id };
        let session = Session::new(stored.token, user_id, &user.name, user.email);
        self.session().establish(session.clone(), true)?;
        Ok(Some(session))
    }

    /// Fetch the profile of the signed-in user.
    ///
    /// # Errors
    /// Returns [`ApiError::NotAuthenticated`] without a session, or the
    /// request error.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let body = self
            .client
            .get(ME_PATH, Auth::Session, PROFILE_LOAD_FAILED)
            .await?;
        ensure_success(&body, PROFILE_LOAD_FAILED)?;
        Ok(UserProfile::from_value(body.get("user")))
    }

    /// Change name and email, updating the session on success.
    ///
    /// # Errors
    /// Returns a validation error for blank fields, or the request error.
    pub async fn update_profile(&self, name: &str, email: &str) -> Result<(), ApiError> {
        require_field("Name", name)?;
        require_field("Email", email)?;
        let body = self
            .client
            .put(
                PROFILE_PATH,
                &json!({ "name": name, "email": email }),
                Auth::Session,
                PROFILE_UPDATE_FAILED,
            )
            .await?;
        ensure_success(&body, PROFILE_UPDATE_FAILED)?;
        self.session().update_profile(name, email)?;
        Ok(())
    }

    /// Change the password. `new` and `confirm` must match before anything is sent.
    ///
    /// # Errors
    /// Returns [`ValidationError::PasswordMismatch`] or a blank-field error
    /// without a request, or the request error.
    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ApiError> {
        if new != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        require_field("Current password", current)?;
        require_field("New password", new)?;
        let body = self
            .client
            .put(
                PASSWORD_PATH,
                &json!({ "currentPassword": current, "newPassword": new }),
                Auth::Session,
                PASSWORD_FAILED,
            )
            .await?;
        ensure_success(&body, PASSWORD_FAILED)
    }

    /// Sign out and forget the stored session.
    ///
    /// # Errors
    /// Returns [`ApiError::Storage`] when the stored keys cannot be removed.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_profile_reads_either_id_key() {
        let user = json!({ "_id": "m1", "name": "Ada", "email": "ada@example.com" });
        assert_eq!(
            UserProfile::from_value(Some(&user)),
            UserProfile {
                id: "m1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into()
            }
        );
        let numeric = json!({ "id": 7 });
        assert_eq!(UserProfile::from_value(Some(&numeric)).id, "7");
        assert_eq!(UserProfile::from_value(None), UserProfile::default());
    }
}
