//! Credential lookup and construction of the active quote provider.

use crate::config::QuotesConfig;
use parking_lot::RwLock;
use quote_client::{HttpClient, ProviderKind, QuoteProvider, VendorEndpoints, build_provider};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Secret store error types.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The store does not accept writes.
    #[error("secret store is read-only")]
    ReadOnly,
}

/// Where provider tokens live. Read once, when the provider is built.
pub trait SecretStore: Send + Sync {
    /// Reads the secret under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    /// Returns error if the store is read-only.
    fn put(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Removes `key`.
    ///
    /// # Errors
    /// Returns error if the store is read-only.
    fn delete(&self, key: &str) -> Result<(), SecretError>;
}

/// Process-local secrets, mostly for tests.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.secrets.write().remove(key);
        Ok(())
    }
}

/// Reads secrets from environment variables: `quote.tradier.token` is
/// looked up as `DESK_QUOTE_TRADIER_TOKEN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    /// Environment variable name for `key`.
    #[must_use]
    pub fn var_name(key: &str) -> String {
        let mapped: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("DESK_{}", mapped)
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::var_name(key))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    fn put(&self, _key: &str, _value: &str) -> Result<(), SecretError> {
        Err(SecretError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> Result<(), SecretError> {
        Err(SecretError::ReadOnly)
    }
}

/// Short SHA-256 prefix identifying a token in logs without revealing it.
#[must_use]
pub fn fingerprint(token: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(token.as_bytes()));
    digest[..12].to_string()
}

/// Builds the provider named in `config`, reading its token from `secrets`.
///
/// Returns `None` (and logs why) when no provider is configured, the vendor
/// needs a token that is missing, or the token is malformed; the quote
/// service then runs on public sources alone.
#[must_use]
pub fn provider_from_config(
    config: &QuotesConfig,
    secrets: &dyn SecretStore,
    http: &HttpClient,
) -> Option<Arc<dyn QuoteProvider>> {
    let kind: ProviderKind = config.provider?;

    let token = if kind.requires_token() {
        let key = kind.secret_key();
        match secrets.get(&key) {
            Some(token) => {
                info!(provider = %kind, token = %fingerprint(&token), "using provider token");
                Some(token)
            }
            None => {
                warn!(provider = %kind, key = %key, "no token configured; using public sources only");
                return None;
            }
        }
    } else {
        None
    };

    let endpoints = VendorEndpoints {
        base_url: config.provider_base_url.clone(),
    };
    match build_provider(kind, token, http.clone(), &endpoints, &config.public) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!(provider = %kind, error = %e, "cannot build provider; using public sources only");
            None
        }
    }
}
