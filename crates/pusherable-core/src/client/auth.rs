//! Pusher REST request signing (auth_version 1.0).

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{ErrorCode, PusherableError, PusherableResult};

pub(crate) const AUTH_VERSION: &str = "1.0";

/// Hex MD5 of a request body, sent as `body_md5`.
pub fn body_md5(body: &str) -> String {
    format!("{:x}", md5::compute(body.as_bytes()))
}

/// HMAC-SHA256 signature over `METHOD\npath\nsorted_query`.
///
/// `params` must not contain `auth_signature` itself.
pub fn sign(
    secret: &str,
    method: &str,
    path: &str,
    params: &BTreeMap<String, String>,
) -> PusherableResult<String> {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let string_to_sign = format!("{}\n{}\n{}", method, path, query);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|e| {
        PusherableError::configuration(ErrorCode::ConfInvalidClient, e.to_string())
    })?;
    mac.update(string_to_sign.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Query parameters of a signed request, `auth_signature` included.
pub(crate) fn signed_params(
    key: &str,
    secret: &str,
    method: &str,
    path: &str,
    body: &str,
    timestamp: i64,
) -> PusherableResult<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    params.insert("auth_key".to_string(), key.to_string());
    params.insert("auth_timestamp".to_string(), timestamp.to_string());
    params.insert("auth_version".to_string(), AUTH_VERSION.to_string());
    params.insert("body_md5".to_string(), body_md5(body));

    let signature = sign(secret, method, path, &params)?;
    params.insert("auth_signature".to_string(), signature);
    Ok(params)
}
