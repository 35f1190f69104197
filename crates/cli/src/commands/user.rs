//! Account management commands.
//!
//! Admins can only be created here; registration over the API always gives
//! the customer role.

use emporium_api::services::auth::{AuthError, RegisterInput, create_account};
use emporium_core::Role;

use super::{CommandError, connect};

/// Errors that can occur while creating an account.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Field checks failed.
    #[error("Invalid account details: {0}")]
    Invalid(emporium_core::ValidationErrors),
}

/// Create an account, optionally with the admin role.
///
/// # Errors
///
/// Returns `UserError::Invalid` for bad fields and `UserError::Auth` if the
/// email is taken or the database fails.
pub async fn create(
    username: String,
    email: String,
    password: String,
    admin: bool,
) -> Result<(), UserError> {
    let role = if admin { Role::Admin } else { Role::Customer };
    let input = RegisterInput {
        username: Some(username),
        email: Some(email),
        password: Some(password),
    };

    let store = connect().await?;

    tracing::info!(
        "Creating {role} account: {}",
        input.email.as_deref().unwrap_or_default()
    );
    let user = create_account(&store, &input, role)
        .await
        .map_err(|e| match e {
            AuthError::Validation(errors) => UserError::Invalid(errors),
            other => UserError::Auth(other),
        })?;

    tracing::info!(user_id = %user.id, "Account created");
    Ok(())
}
