use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use tracing::debug;

use shared_models::auth::TokenClaims;

/// Decodes the claims segment of a bearer token. The signature belongs to the
/// API and is not checked here.
pub fn decode_claims(token: &str) -> Result<TokenClaims, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })
}

pub fn is_expired_at(claims: &TokenClaims, now: i64) -> bool {
    match claims.exp {
        Some(exp) => (exp as i64) < now,
        None => false,
    }
}

/// Whether a persisted token can still be used. Undecodable tokens are kept:
/// the API is the authority and will answer 401 if it disagrees.
pub fn token_usable(token: &str) -> bool {
    match decode_claims(token) {
        Ok(claims) => {
            let now = Utc::now().timestamp();
            if is_expired_at(&claims, now) {
                debug!("Token expired at {:?} (now: {})", claims.exp, now);
                return false;
            }
            true
        }
        Err(e) => {
            debug!("Token claims unreadable ({}), deferring to the API", e);
            !token.trim().is_empty()
        }
    }
}
