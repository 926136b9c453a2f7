//! Signed session cookie.
//!
//! The cookie value is `hex(payload).hex(hmac_sha256(payload))`. The payload
//! is the JSON form of a `SessionToken`; the signature keeps clients from
//! editing it, and the session record check in the core catches everything
//! else.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CookieError {
    #[error("cookie value is not in payload.signature form")]
    Format,

    #[error("cookie value is not valid hex")]
    Encoding,

    #[error("cookie signature does not match")]
    Signature,

    #[error("cookie payload is not UTF-8")]
    Utf8,
}

/// Signs and verifies cookie payloads with a server-side key.
#[derive(Clone)]
pub struct CookieSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length")
    }

    /// Produce the signed cookie value for `payload`.
    pub fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();
        format!("{}.{}", hex::encode(payload), hex::encode(signature))
    }

    /// Check a cookie value's signature and return the embedded payload.
    pub fn verify(&self, value: &str) -> Result<String, CookieError> {
        let (payload_hex, signature_hex) = value.split_once('.').ok_or(CookieError::Format)?;
        let payload = hex::decode(payload_hex).map_err(|_| CookieError::Encoding)?;
        let signature = hex::decode(signature_hex).map_err(|_| CookieError::Encoding)?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| CookieError::Signature)?;

        String::from_utf8(payload).map_err(|_| CookieError::Utf8)
    }
}

/// Find a cookie by name across all `Cookie` request headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// `Set-Cookie` value that installs the session cookie.
pub fn session_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that empties and expires the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn signer() -> CookieSigner {
        CookieSigner::new("test-secret-that-is-long-enough-for-hmac")
    }

    #[test]
    fn sign_then_verify_returns_payload() {
        let payload = r#"{"sessId":1,"expiryTimeUnix":2,"userId":3}"#;
        let value = signer().sign(payload);
        assert_eq!(signer().verify(&value).unwrap(), payload);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let value = signer().sign(r#"{"userId":3}"#);
        let (_, sig) = value.split_once('.').unwrap();
        let forged = format!("{}.{sig}", hex::encode(r#"{"userId":1}"#));
        assert_eq!(signer().verify(&forged), Err(CookieError::Signature));
    }

    #[test]
    fn other_key_is_rejected() {
        let value = CookieSigner::new("another-secret-of-sufficient-length!").sign("x");
        assert_eq!(signer().verify(&value), Err(CookieError::Signature));
    }

    #[test]
    fn garbage_values_are_rejected() {
        assert_eq!(signer().verify("no-dot"), Err(CookieError::Format));
        assert_eq!(signer().verify("zz.zz"), Err(CookieError::Encoding));
        assert_eq!(signer().verify("."), Err(CookieError::Signature));
    }

    #[test]
    fn read_cookie_finds_named_pair() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; session=abc.def"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(read_cookie(&headers, SESSION_COOKIE), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "other"), Some("1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn cookie_attributes() {
        let set = session_cookie("v", 604_800, true);
        assert!(set.starts_with("session=v;"));
        assert!(set.contains("Max-Age=604800"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Lax"));
        assert!(set.ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.starts_with("session=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
