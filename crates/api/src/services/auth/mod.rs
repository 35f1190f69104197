//! Authentication service.
//!
//! Password accounts with argon2 hashes and stateless bearer tokens.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::TokenKeys;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{Email, Role, UserId, ValidationErrors, require_text};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum username length.
const MIN_USERNAME_LENGTH: usize = 3;

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `PUT /users/profile`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Body of `PUT /users/password`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Authentication service.
///
/// Handles registration, login, profile changes and password changes.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenKeys) -> Self {
        Self { store, tokens }
    }

    /// Register a customer account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for bad fields and
    /// `AuthError::UserAlreadyExists` if the email is registered.
    #[instrument(skip_all)]
    pub async fn register(&self, input: &RegisterInput) -> Result<(User, String), AuthError> {
        let user = create_account(self.store, input, Role::Customer).await?;
        let token = self.tokens.issue(user.id)?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, input: &LoginInput) -> Result<(User, String), AuthError> {
        let mut errors = ValidationErrors::new();
        let email = require_text(&mut errors, "email", input.email.as_deref(), 1);
        let password = input.password.as_deref().filter(|p| !p.is_empty());
        if password.is_none() {
            errors.add("password", "password is required");
        }
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::Validation(errors));
        };

        let email = Email::parse(&email).map_err(|_| AuthError::InvalidCredentials)?;
        let (user, password_hash) = self
            .store
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// The user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account has been removed.
    pub async fn profile(&self, user: UserId) -> Result<User, AuthError> {
        self.store
            .get_user(user)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change username and/or email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for bad fields and
    /// `AuthError::UserAlreadyExists` if the new email belongs to someone else.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();
        let username = update.username.as_deref().and_then(|name| {
            require_text(&mut errors, "username", Some(name), MIN_USERNAME_LENGTH)
        });
        let email = update
            .email
            .as_deref()
            .and_then(|email| parse_email(&mut errors, Some(email)));
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        self.store
            .update_profile(user, username.as_deref(), email.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if `current_password` is wrong
    /// and `AuthError::Validation` if the new password is too short.
    #[instrument(skip(self, change))]
    pub async fn change_password(
        &self,
        user: UserId,
        change: &PasswordChange,
    ) -> Result<(), AuthError> {
        let mut errors = ValidationErrors::new();
        let current = change.current_password.as_deref().unwrap_or_default();
        if current.is_empty() {
            errors.add("currentPassword", "currentPassword is required");
        }
        let new_password =
            check_password(&mut errors, "newPassword", change.new_password.as_deref());
        let Some(new_password) = new_password.filter(|_| errors.is_empty()) else {
            return Err(AuthError::Validation(errors));
        };

        let existing = self
            .store
            .get_password_hash(user)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(current, &existing).map_err(|_| AuthError::IncorrectPassword)?;

        let hash = hash_password(new_password)?;
        self.store.set_password_hash(user, &hash).await?;
        tracing::info!(user_id = %user, "password changed");
        Ok(())
    }
}

/// Validate registration fields and store a new account with `role`.
///
/// Shared by registration and the CLI, which has no token keys.
///
/// # Errors
///
/// Returns `AuthError::Validation` for bad fields and
/// `AuthError::UserAlreadyExists` if the email is registered.
pub async fn create_account(
    store: &dyn Store,
    input: &RegisterInput,
    role: Role,
) -> Result<User, AuthError> {
    let mut errors = ValidationErrors::new();
    let username = require_text(
        &mut errors,
        "username",
        input.username.as_deref(),
        MIN_USERNAME_LENGTH,
    );
    let email = parse_email(&mut errors, input.email.as_deref());
    let password = check_password(&mut errors, "password", input.password.as_deref());

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(AuthError::Validation(errors));
    };

    let password_hash = hash_password(password)?;
    store
        .create_user(&NewUser {
            username,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
}

/// Parse and record an email field.
fn parse_email(errors: &mut ValidationErrors, value: Option<&str>) -> Option<Email> {
    let value = require_text(errors, "email", value, 1)?;
    Email::parse(&value)
        .map_err(|e| errors.add("email", format!("invalid email: {e}")))
        .ok()
}

/// Validate password meets requirements.
fn check_password<'p>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&'p str>,
) -> Option<&'p str> {
    let Some(password) = value.filter(|p| !p.is_empty()) else {
        errors.add(field, format!("{field} is required"));
        return None;
    };
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            field,
            format!("{field} must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
        return None;
    }
    Some(password)
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::{MemoryStore, UserStore};

    fn tokens() -> TokenKeys {
        TokenKeys::new(
            &SecretString::from("k3Yf9!qLm2#Zp7@wXr4$Tn8&Vb1^Hc6*"),
            Duration::from_secs(60),
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            username: Some("alice".to_string()),
            email: Some(email.to_string()),
            password: Some("hunter22".to_string()),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let (user, token) = auth.register(&register_input(" Alice@Example.com ")).await.unwrap();
        assert_eq!(user.email.as_str(), "alice@example.com");
        assert_eq!(user.role, Role::Customer);
        assert_eq!(tokens.verify(&token).unwrap(), user.id);

        let (logged_in, _) = auth
            .login(&LoginInput {
                email: Some("ALICE@example.com".to_string()),
                password: Some("hunter22".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let err = auth
            .register(&RegisterInput {
                username: Some("al".to_string()),
                email: Some("not-an-email".to_string()),
                password: Some("12345".to_string()),
            })
            .await
            .unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("username"));
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        auth.register(&register_input("a@example.com")).await.unwrap();
        assert!(matches!(
            auth.register(&register_input("A@example.com")).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register(&register_input("a@example.com")).await.unwrap();

        let err = auth
            .login(&LoginInput {
                email: Some("a@example.com".to_string()),
                password: Some("wrong-password".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_change_password() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let (user, _) = auth.register(&register_input("a@example.com")).await.unwrap();

        let err = auth
            .change_password(
                user.id,
                &PasswordChange {
                    current_password: Some("nope-nope".to_string()),
                    new_password: Some("brand-new".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));

        auth.change_password(
            user.id,
            &PasswordChange {
                current_password: Some("hunter22".to_string()),
                new_password: Some("brand-new".to_string()),
            },
        )
        .await
        .unwrap();

        let login = LoginInput {
            email: Some("a@example.com".to_string()),
            password: Some("brand-new".to_string()),
        };
        assert!(auth.login(&login).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let (user, _) = auth.register(&register_input("a@example.com")).await.unwrap();

        let updated = auth
            .update_profile(
                user.id,
                &ProfileUpdate {
                    username: Some("  alicia ".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.email, user.email);

        let err = auth
            .update_profile(
                user.id,
                &ProfileUpdate {
                    username: Some("x".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_admin_account() {
        let store = MemoryStore::new();
        let admin = create_account(&store, &register_input("boss@example.com"), Role::Admin)
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(store.get_password_hash(admin.id).await.unwrap().is_some());
    }
}
