use crate::shared::AppError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Checks that an email and password were both supplied
pub fn validate_credentials_present(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password are required."));
    }
    Ok(())
}

/// Validates an email address.
///
/// This is a shape check only (local part, `@`, dotted domain). The API is the
/// authority on whether the address is deliverable or registered.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::validation("Email is required."));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(AppError::validation("Please enter a valid email address."));
    }

    Ok(())
}

/// Validates a new password
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Checks that a password and its confirmation are identical
pub fn validate_password_match(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password != confirmation {
        return Err(AppError::validation("Passwords do not match."));
    }
    Ok(())
}

/// Checks that a password reset link carried a token
pub fn validate_reset_token(token: Option<&str>) -> Result<&str, AppError> {
    match token.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::validation("Invalid or missing reset token.")),
    }
}
