use serde::{Deserialize, Serialize};

use crate::error::{Result, VolleynetError};

/// The account a login belongs to, as shown on the page after logging in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub id: u32,
    pub name: String,
}

/// An authenticated volleynet session.
///
/// Holds the session cookie returned by the login form. Entering and
/// withdrawing from tournaments need one of these; reading pages does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
    login: LoginData,
}

impl Session {
    /// Build a session from a raw `Set-Cookie` value; cookie attributes are dropped.
    pub fn new(cookie: &str, login: LoginData) -> Self {
        Self {
            cookie: trim_cookie(cookie).to_string(),
            login,
        }
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn login(&self) -> &LoginData {
        &self.login
    }

    pub(crate) fn require_cookie(&self) -> Result<&str> {
        if self.cookie.is_empty() {
            return Err(VolleynetError::Auth("session cookie must be set".to_string()));
        }
        Ok(&self.cookie)
    }
}

/// `"PHPSESSID=abc; path=/"` -> `"PHPSESSID=abc"`.
pub(crate) fn trim_cookie(header: &str) -> &str {
    match header.split_once(';') {
        Some((cookie, _)) => cookie.trim(),
        None => header.trim(),
    }
}
