//! Credential extraction and the admin gate
//!
//! Database credentials arrive as `Authorization: Basic …` or as an `auth`
//! object in the request body; admin credentials use the
//! `X-Admin-Authorization` header or an `admin_auth` body object. Header
//! credentials take precedence over body credentials.

use crate::models::Credentials;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Header carrying database credentials
pub const AUTH_HEADER: &str = "authorization";
/// Header carrying admin credentials
pub const ADMIN_AUTH_HEADER: &str = "x-admin-authorization";

/// Parse `Basic base64(user:pass)` out of the named header
pub fn basic_credentials(headers: &HeaderMap, header: &str) -> Option<(String, String)> {
    let value = headers.get(header)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Pick the effective credentials: header first, then body
pub fn effective_credentials(
    headers: &HeaderMap,
    header: &str,
    body: Option<&Credentials>,
) -> (String, String) {
    if let Some(creds) = basic_credentials(headers, header) {
        return creds;
    }
    match body {
        Some(c) => (c.username.clone(), c.password.clone()),
        None => (String::new(), String::new()),
    }
}

/// Admin authentication gate
///
/// Disabled (every request passes) unless the server was configured with
/// both an admin username and password.
#[derive(Debug, Clone, Default)]
pub struct AdminAuth {
    credentials: Option<(String, String)>,
}

impl AdminAuth {
    /// Create a gate from optional configured credentials
    pub fn new(credentials: Option<(String, String)>) -> Self {
        AdminAuth { credentials }
    }

    /// Whether the gate is active
    pub fn enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Check a credential pair
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match &self.credentials {
            None => true,
            Some((user, pass)) => user == username && pass == password,
        }
    }

    /// Check a request's admin credentials from headers or body
    pub fn check_request(&self, headers: &HeaderMap, body: Option<&Credentials>) -> bool {
        if !self.enabled() {
            return true;
        }
        let (user, pass) = effective_credentials(headers, ADMIN_AUTH_HEADER, body);
        self.verify(&user, &pass)
    }
}
