// ABOUTME: Secure HTTP cookie utilities for the session token
// ABOUTME: Builds httpOnly SameSite cookies and reads cookie values from requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Write;

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the session cookie carrying the JWT
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Cookie attributes
#[derive(Debug, Clone)]
pub struct SecureCookieConfig {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Max-Age in seconds
    pub max_age_secs: i64,
    /// `HttpOnly` flag
    pub http_only: bool,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// `SameSite` policy
    pub same_site: SameSitePolicy,
    /// Cookie path
    pub path: String,
}

/// `SameSite` cookie policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    /// First-party context only
    Strict,
    /// Also sent on top-level navigation
    Lax,
    /// Sent in all contexts (requires Secure)
    None,
}

impl SecureCookieConfig {
    /// `HttpOnly`, `SameSite=Lax`, path `/`
    #[must_use]
    pub fn new(name: &str, value: &str, max_age_secs: i64, secure: bool) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_owned(),
            max_age_secs,
            http_only: true,
            secure,
            same_site: SameSitePolicy::Lax,
            path: "/".to_owned(),
        }
    }

    /// Build the Set-Cookie header value
    #[must_use]
    pub fn build(&self) -> String {
        let mut cookie = format!("{}={}", self.name, self.value);
        let _ = write!(cookie, "; Max-Age={}; Path={}", self.max_age_secs, self.path);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        match self.same_site {
            SameSitePolicy::Strict => cookie.push_str("; SameSite=Strict"),
            SameSitePolicy::Lax => cookie.push_str("; SameSite=Lax"),
            SameSitePolicy::None => cookie.push_str("; SameSite=None"),
        }

        cookie
    }
}

/// Set the session cookie
pub fn set_auth_cookie(headers: &mut HeaderMap, token: &str, max_age_secs: i64, secure: bool) {
    let cookie = SecureCookieConfig::new(AUTH_COOKIE_NAME, token, max_age_secs, secure);
    if let Ok(value) = HeaderValue::from_str(&cookie.build()) {
        headers.insert(header::SET_COOKIE, value);
    }
}

/// Expire the session cookie
pub fn clear_auth_cookie(headers: &mut HeaderMap, secure: bool) {
    set_auth_cookie(headers, "", 0, secure);
}

/// Extract a cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name.trim() == cookie_name).then(|| value.trim().to_owned())
        })
}
