//! Credential-triple header names. The three values travel together on
//! every authenticated request and are re-issued on every authenticated
//! response.

pub const ACCESS_TOKEN: &str = "access-token";
pub const CLIENT: &str = "client";
pub const UID: &str = "uid";
