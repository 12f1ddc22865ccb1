//! Submitter identity derivation
//!
//! Derives a stable, non-reversible identity token from request metadata:
//! an authenticated user id when present, otherwise the client network
//! address. The token is what the dedup and vote tables key on, so the raw
//! address never lands in storage.
//!
//! Invariant: the hash key is derived from the `IDENTITY_SALT` environment
//! variable and must stay stable for the lifetime of a deployment (and be
//! shared across instances). Rotating it does not corrupt anything, but it
//! resets duplicate detection: every past submitter looks new again.

use actix_web::HttpRequest;
use once_cell::sync::Lazy;
use std::env;
use std::net::IpAddr;

const KEY_CONTEXT: &str = "starboard 2024-03 identity hasher v1";

/// Sentinel token used when no network address is determinable.
pub const UNKNOWN_TOKEN: &str = "unknown";

static IDENTITY_KEY: Lazy<[u8; 32]> = Lazy::new(|| match env::var("IDENTITY_SALT") {
    Ok(salt) if !salt.trim().is_empty() => blake3::derive_key(KEY_CONTEXT, salt.as_bytes()),
    _ => {
        log::warn!(
            "IDENTITY_SALT is not set. Falling back to a built-in development salt. \
             Set a stable salt in production: identity tokens must not change across \
             restarts or instances, or duplicate detection resets."
        );
        blake3::derive_key(KEY_CONTEXT, b"starboard-dev-salt")
    }
});

/// Force the hash key to load (and warn early if the salt is missing).
pub fn init() {
    Lazy::force(&IDENTITY_KEY);
}

/// How an identity was derived. Unknown identities are exempt from
/// duplicate suppression so one ambiguous client cannot block all others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentitySource {
    User,
    Address,
    Unknown,
}

/// A hashed requester identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    token: String,
    source: IdentitySource,
}

impl Identity {
    /// The opaque fixed-length token stored as submitter/voter identity.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_unknown(&self) -> bool {
        self.source == IdentitySource::Unknown
    }

    /// Whether this identity participates in duplicate suppression.
    /// Unknown identities pass the duplicate check but stay rate limited.
    pub fn dedup_eligible(&self) -> bool {
        !self.is_unknown()
    }

    pub fn unknown() -> Self {
        Self {
            token: UNKNOWN_TOKEN.to_string(),
            source: IdentitySource::Unknown,
        }
    }
}

/// Derive the identity for a request. An authenticated user id wins over
/// the network address so a roaming logged-in user maps to one identity.
pub fn hash_identity(address: Option<&str>, user_id: Option<&str>) -> Identity {
    if let Some(uid) = user_id {
        let uid = uid.trim();
        if !uid.is_empty() {
            return Identity {
                token: digest(&format!("user:{}", uid)),
                source: IdentitySource::User,
            };
        }
    }

    if let Some(addr) = address {
        let addr = addr.trim();
        if !addr.is_empty() {
            return Identity {
                token: digest(&format!("addr:{}", addr)),
                source: IdentitySource::Address,
            };
        }
    }

    Identity::unknown()
}

fn digest(input: &str) -> String {
    let hash = blake3::keyed_hash(&IDENTITY_KEY, input.as_bytes());
    // 128 bits of the digest is plenty for dedup keys and keeps the column short.
    hash.to_hex()[..32].to_string()
}

/// Request metadata supplied by the outer web layer.
#[derive(Debug, Clone, Default)]
pub struct RequesterMeta {
    pub address: Option<String>,
    pub user_id: Option<String>,
    pub locale: Option<String>,
}

impl RequesterMeta {
    /// Extract requester metadata from an HTTP request.
    ///
    /// The authenticated user id, when present, arrives in the
    /// `x-authenticated-user` header set by the site's auth layer.
    pub fn from_request(req: &HttpRequest) -> Self {
        Self {
            address: extract_client_ip(req),
            user_id: header_value(req, "x-authenticated-user"),
            locale: header_value(req, "accept-language")
                .and_then(|v| v.split(',').next().map(|tag| tag.trim().to_string()))
                .filter(|tag| !tag.is_empty()),
        }
    }

    pub fn identity(&self) -> Identity {
        hash_identity(self.address.as_deref(), self.user_id.as_deref())
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extract the real client IP address from an HTTP request.
///
/// Checks headers in order of preference:
/// 1. X-Forwarded-For (first IP in the list)
/// 2. X-Real-IP
/// 3. Remote peer address
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    // Check X-Forwarded-For header (proxy chains)
    if let Some(xff) = req.headers().get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            // Take the first IP in the chain (the original client)
            if let Some(first_ip) = xff_str.split(',').next() {
                let trimmed = first_ip.trim();
                if trimmed.parse::<IpAddr>().is_ok() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }

    // Check X-Real-IP header (nginx, etc.)
    if let Some(xri) = req.headers().get("x-real-ip") {
        if let Ok(xri_str) = xri.to_str() {
            let trimmed = xri_str.trim();
            if trimmed.parse::<IpAddr>().is_ok() {
                return Some(trimmed.to_string());
            }
        }
    }

    // Fall back to peer address
    if let Some(peer_addr) = req.peer_addr() {
        return Some(peer_addr.ip().to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_same_input_same_token() {
        let a = hash_identity(Some("192.168.1.1"), None);
        let b = hash_identity(Some("192.168.1.1"), None);
        assert_eq!(a.token(), b.token());
    }

    #[test]
    fn test_distinct_inputs_distinct_tokens() {
        let a = hash_identity(Some("192.168.1.1"), None);
        let b = hash_identity(Some("192.168.1.2"), None);
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn test_token_is_fixed_length_and_opaque() {
        let id = hash_identity(Some("2001:db8::1"), None);
        assert_eq!(id.token().len(), 32);
        assert!(!id.token().contains("2001"));
        assert!(id.token().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_user_id_takes_precedence_over_address() {
        let roaming_home = hash_identity(Some("10.0.0.1"), Some("user-42"));
        let roaming_cafe = hash_identity(Some("203.0.113.9"), Some("user-42"));
        assert_eq!(roaming_home.token(), roaming_cafe.token());

        let anonymous = hash_identity(Some("10.0.0.1"), None);
        assert_ne!(roaming_home.token(), anonymous.token());
    }

    #[test]
    fn test_user_and_address_hashes_never_collide_on_raw_value() {
        let by_user = hash_identity(None, Some("192.168.1.1"));
        let by_addr = hash_identity(Some("192.168.1.1"), None);
        assert_ne!(by_user.token(), by_addr.token());
    }

    #[test]
    fn test_no_metadata_falls_back_to_unknown() {
        let id = hash_identity(None, None);
        assert_eq!(id.token(), UNKNOWN_TOKEN);
        assert!(id.is_unknown());
        assert!(!id.dedup_eligible());

        let blank = hash_identity(Some("   "), Some(""));
        assert!(blank.is_unknown());
    }

    #[test]
    fn test_known_identity_is_dedup_eligible() {
        assert!(hash_identity(Some("192.168.1.1"), None).dedup_eligible());
        assert!(hash_identity(None, Some("user-1")).dedup_eligible());
    }

    #[test]
    fn test_requester_meta_from_headers() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "198.51.100.7, 10.0.0.2"))
            .insert_header(("x-authenticated-user", "user-9"))
            .insert_header(("accept-language", "fr-FR,fr;q=0.9,en;q=0.8"))
            .to_http_request();

        let meta = RequesterMeta::from_request(&req);
        assert_eq!(meta.address.as_deref(), Some("198.51.100.7"));
        assert_eq!(meta.user_id.as_deref(), Some("user-9"));
        assert_eq!(meta.locale.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn test_invalid_forwarded_header_is_ignored() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "not-an-ip"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), None);
    }
}
