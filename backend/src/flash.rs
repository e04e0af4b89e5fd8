//! One-time feedback messages carried across a redirect.
//!
//! A flash is written as a signed cookie on the redirect response. The next
//! rendered page takes it out of the jar, shows it once, and clears the cookie.

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};

pub const FLASH_COOKIE: &str = "bank_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(FlashLevel::Success),
            "error" => Some(FlashLevel::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        format!("{}.{}", self.level.as_str(), urlencoding::encode(&self.message))
    }

    fn decode(value: &str) -> Option<Self> {
        let (level, encoded) = value.split_once('.')?;
        Some(Self {
            level: FlashLevel::parse(level)?,
            message: urlencoding::decode(encoded).ok()?.into_owned(),
        })
    }
}

/// Cookie signing key derived from the configured secret.
///
/// `Key` needs 64 bytes of material, so the secret is stretched with SHA-512.
pub fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// Queue the flash on the response jar
pub fn push(jar: SignedCookieJar, flash: &Flash) -> SignedCookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, flash.encode()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Take the flash out of the request jar.
///
/// The returned jar carries the removal cookie, so the message is shown once.
/// Cookies that fail verification are never returned.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };

    let flash = Flash::decode(cookie.value());
    if flash.is_none() {
        tracing::warn!("Ignoring malformed flash cookie");
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}
