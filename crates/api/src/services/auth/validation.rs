//! Field validation for account requests.
//!
//! Each function records a message in [`FieldErrors`] and returns the
//! normalized value when the field is valid, so callers can validate every
//! field before reporting.

use shopfront_core::Email;

use crate::error::FieldErrors;

/// Minimum display name length, in characters.
pub const MIN_NAME_LENGTH: usize = 3;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Trimmed name of at least [`MIN_NAME_LENGTH`] characters.
pub fn name(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let Some(value) = present(value) else {
        errors.add("name", "Name is required");
        return None;
    };

    if value.chars().count() < MIN_NAME_LENGTH {
        errors.add(
            "name",
            format!("Name must be at least {MIN_NAME_LENGTH} characters long"),
        );
        return None;
    }

    Some(value.to_owned())
}

/// Well-formed email address.
pub fn email(errors: &mut FieldErrors, value: Option<&str>) -> Option<Email> {
    let Some(value) = present(value) else {
        errors.add("email", "Email is required");
        return None;
    };

    Email::parse(value)
        .inspect_err(|_| errors.add("email", "Invalid email format"))
        .ok()
}

/// Password of at least [`MIN_PASSWORD_LENGTH`] characters once trimmed.
///
/// The returned password is the raw input; only the length check ignores
/// surrounding whitespace.
pub fn password(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        errors.add("password", "Password is required");
        return None;
    };

    if raw.trim().chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
        );
        return None;
    }

    Some(raw.to_owned())
}

/// Current and new password for a password change.
///
/// Both are required, the new one must satisfy the length rule and differ
/// from the current one.
pub fn password_change(
    errors: &mut FieldErrors,
    current: Option<&str>,
    new: Option<&str>,
) -> Option<(String, String)> {
    let (Some(current), Some(new)) = (
        current.filter(|v| !v.trim().is_empty()),
        new.filter(|v| !v.trim().is_empty()),
    ) else {
        errors.add(
            "newPassword",
            "Both current and new password must be provided",
        );
        return None;
    };

    if new.trim().chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "newPassword",
            format!("New password must be at least {MIN_PASSWORD_LENGTH} characters long"),
        );
        return None;
    }

    if current == new {
        errors.add(
            "newPassword",
            "New password must be different from the current password",
        );
        return None;
    }

    Some((current.to_owned(), new.to_owned()))
}
