//! OAuth 1.0a request signing (HMAC-SHA1).

use crate::utils::error::{Result, ThoughtError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay as-is, everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

#[derive(Debug, Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: Option<String>,
    pub token_secret: Option<String>,
}

impl OAuth1Credentials {
    pub fn consumer(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
            token_secret: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.token_secret = Some(token_secret.into());
        self
    }
}

/// `METHOD&base_url&normalized_params`, each part percent-encoded.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| ThoughtError::ValidationError {
        message: format!("cannot sign request to '{}': {}", url, e),
    })?;
    let base_url = &parsed[..url::Position::AfterPath];

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&normalized)
    ))
}

pub fn sign(base_string: &str, consumer_secret: &str, token_secret: Option<&str>) -> Result<String> {
    let key = format!(
        "{}&{}",
        encode(consumer_secret),
        encode(token_secret.unwrap_or(""))
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| {
        ThoughtError::ProcessingError {
            message: format!("invalid signing key: {}", e),
        }
    })?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    credentials: OAuth1Credentials,
}

impl OAuth1Signer {
    pub fn new(credentials: OAuth1Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &OAuth1Credentials {
        &self.credentials
    }

    /// `Authorization` header value for a request whose body or query carries `params`.
    pub fn authorization(&self, method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, params, &nonce, &timestamp)
    }

    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let mut oauth_params: Vec<(String, String)> = vec![
            ("oauth_consumer_key".to_string(), self.credentials.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
        ];
        if let Some(token) = &self.credentials.token {
            oauth_params.push(("oauth_token".to_string(), token.clone()));
        }
        oauth_params.push(("oauth_version".to_string(), "1.0".to_string()));

        let mut all_params = oauth_params.clone();
        all_params.extend_from_slice(params);

        let base_string = signature_base_string(method, url, &all_params)?;
        let signature = sign(
            &base_string,
            &self.credentials.consumer_secret,
            self.credentials.token_secret.as_deref(),
        )?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_reserved_characters() {
        assert_eq!(encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(encode("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(encode("!*'()"), "%21%2A%27%28%29");
        assert_eq!(encode("é"), "%C3%A9");
    }

    #[test]
    fn test_signature_matches_reference_example() {
        let credentials = OAuth1Credentials::consumer(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        )
        .with_token(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        let signer = OAuth1Signer::new(credentials);

        let header = signer
            .authorization_with(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json",
                &params(&[
                    ("include_entities", "true"),
                    ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ]),
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                "1318622958",
            )
            .unwrap();

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"tnnArxj06cWHq44gCs1OSKk%2FjLY%3D\""));
        assert!(header.contains("oauth_token=\"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\""));
        assert!(!header.contains("include_entities"));
    }

    #[test]
    fn test_base_string_drops_query_and_sorts_params() {
        let base = signature_base_string(
            "get",
            "https://www.instapaper.com/api/1/bookmarks/list?ignored=1",
            &params(&[("b", "2"), ("a", "1"), ("a", "0")]),
        )
        .unwrap();
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fwww.instapaper.com%2Fapi%2F1%2Fbookmarks%2Flist&a%3D0%26a%3D1%26b%3D2"
        );
    }

    #[test]
    fn test_consumer_only_signature_has_no_token() {
        let signer = OAuth1Signer::new(OAuth1Credentials::consumer("key", "secret"));
        let header = signer
            .authorization("POST", "https://www.instapaper.com/api/1/oauth/access_token", &[])
            .unwrap();
        assert!(!header.contains("oauth_token="));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
    }
}
