use std::sync::LazyLock;

use regex::Regex;

use crate::ClientError;
use crate::messages;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Sign-up / reset style password checks: presence is the caller's
/// concern, this covers length and confirmation equality.
pub fn check_password_pair(password: &str, confirmation: &str) -> Result<(), ClientError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(messages::PASSWORD_TOO_SHORT));
    }
    if password != confirmation {
        return Err(ClientError::validation(messages::PASSWORD_MISMATCH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(valid_email("someone@example.com"));
        assert!(valid_email("a.b+c@mail.example.co.jp"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!valid_email(""));
        assert!(!valid_email("someone"));
        assert!(!valid_email("someone@"));
        assert!(!valid_email("someone.example.com"));
        assert!(!valid_email("some one@example.com"));
    }

    #[test]
    fn password_pair_rules() {
        assert!(check_password_pair("password123", "password123").is_ok());

        let short = check_password_pair("seven77", "seven77").unwrap_err();
        assert_eq!(short.user_message(), messages::PASSWORD_TOO_SHORT);

        let mismatch = check_password_pair("password123", "password124").unwrap_err();
        assert_eq!(mismatch.user_message(), messages::PASSWORD_MISMATCH);
    }
}
