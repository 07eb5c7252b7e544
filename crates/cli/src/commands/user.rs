//! Account management commands.
//!
//! The API only ever registers `user` accounts; admins are created or
//! promoted from here.
//!
//! # Usage
//!
//! ```bash
//! shop-cli user create -e admin@example.com -n "Admin Name" -p "long-password" -r admin
//! shop-cli user promote -e someone@example.com -r admin
//! ```

use shopfront_api::db::RepositoryError;
use shopfront_api::db::users::{NewUser, UserRepository};
use shopfront_api::error::FieldErrors;
use shopfront_api::services::auth::{hash_password, validation};
use shopfront_core::{Email, Role};

use super::{CommandError, connect};

fn parse_role(role: &str) -> Result<Role, CommandError> {
    role.parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))
}

/// Create a new account with a password.
///
/// Name, email and password follow the same rules as registration.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if a field fails validation,
/// `CommandError::UserExists` if the email is taken.
pub async fn create(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<i32, CommandError> {
    let role = parse_role(role)?;

    let mut errors = FieldErrors::new();
    let name = validation::name(&mut errors, Some(name));
    let email = validation::email(&mut errors, Some(email));
    let password = validation::password(&mut errors, Some(password));
    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return Err(CommandError::Invalid(errors));
    };

    let password_hash = hash_password(&password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    tracing::info!("Creating user: {} ({})", email, role);

    if users.get_by_email(&email).await?.is_some() {
        return Err(CommandError::UserExists(email.to_string()));
    }

    let user = users
        .create(NewUser {
            name: &name,
            email: &email,
            password_hash: &password_hash,
            role,
            avatar: None,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CommandError::UserExists(email.to_string()),
            other => CommandError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id.as_i32())
}

/// Set the role of an existing account.
///
/// # Errors
///
/// Returns `CommandError::UserNotFound` if no account has this email.
pub async fn promote(email: &str, role: &str) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let parsed = Email::parse(email.trim()).map_err(|_| {
        CommandError::Invalid(FieldErrors::single("email", "Invalid email format"))
    })?;

    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&parsed, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::UserNotFound(email.to_owned()),
            other => CommandError::Repository(other),
        })?;

    tracing::info!("{} is now {}", user.email, user.role);
    Ok(())
}
