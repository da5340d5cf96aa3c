//! User-facing messages for operation failures. Pre-flight validation and
//! request rejections both resolve to one of these.

pub const REQUIRED_FIELDS: &str = "Required fields are missing.";
pub const INVALID_EMAIL: &str = "The email address format is invalid.";
pub const PASSWORD_TOO_SHORT: &str = "Passwords must be at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The passwords do not match.";
pub const EMAIL_AND_PASSWORD_REQUIRED: &str = "Enter your email address and password.";
pub const EMAIL_REQUIRED: &str = "Enter your email address.";

pub const EMAIL_TAKEN: &str =
    "That email address is already registered. Sign up with a different one.";
pub const EMAIL_REJECTED: &str =
    "The email address was rejected. Check it for mistakes.";
pub const BAD_REQUEST: &str = "The request could not be processed.";
pub const SIGN_IN_FAILED: &str =
    "You appear to be offline, or the email address or password is wrong.";
pub const SIGN_OUT_FAILED: &str = "Check that you are online and try signing out again.";
pub const RESET_FAILED: &str =
    "An unexpected error occurred. Check that you are online and contact support if it persists.";
pub const USERID_TAKEN: &str = "That ID is already taken. Try another one.";
pub const EMAIL_TAKEN_EDIT: &str =
    "That email address is already registered. Set a different one.";
pub const UNKNOWN: &str = "An unknown error occurred. Contact the administrator.";
