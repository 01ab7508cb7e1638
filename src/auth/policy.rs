use crate::error::AppError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
const EMAIL_MAX: usize = 254;

pub fn normalize_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(AppError::validation(format!(
            "Username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'))
    {
        return Err(AppError::validation(
            "Username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(username.to_string())
}

/// Trimmed and lower-cased.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    };

    if !valid || email.len() > EMAIL_MAX {
        return Err(AppError::validation("Enter a valid email address"));
    }
    Ok(email)
}

pub fn check_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(AppError::validation(format!(
            "Password must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"
        )));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|ch| ch.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AppError::validation(
            "Password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_password, normalize_email, normalize_username};

    #[test]
    fn password_policy() {
        assert!(check_password("abc12345").is_ok());
        assert!(check_password("short1").is_err());
        assert!(check_password("lettersonly").is_err());
        assert!(check_password("1234567890").is_err());
        assert!(check_password(&format!("a1{}", "x".repeat(127))).is_err());
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Alice@Campus.EDU ").expect("valid email"),
            "alice@campus.edu"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("a@b@c").is_err());
        assert!(normalize_email("@campus.edu").is_err());
        assert!(normalize_email("alice@").is_err());
    }

    #[test]
    fn username_rules() {
        assert_eq!(normalize_username(" Dorm_Kid.01 ").expect("valid"), "Dorm_Kid.01");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username(&"a".repeat(33)).is_err());
    }
}
