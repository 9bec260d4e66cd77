use crate::provider::{HttpProvider, ProviderError};
use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub provider_url: String,
    pub provider_secret_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(provider_url: String, provider_secret_key: SecretString) -> Self {
        Self {
            provider_url,
            provider_secret_key,
        }
    }

    /// Backend API client for the configured identity provider.
    ///
    /// # Errors
    /// Returns an error if the provider URL is not a valid http(s) URL.
    pub fn provider(&self) -> Result<HttpProvider, ProviderError> {
        HttpProvider::new(&self.provider_url, self.provider_secret_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://api.clerk.test".to_string(),
            SecretString::from("sk_test_123"),
        );
        assert_eq!(args.provider_url, "https://api.clerk.test");
        assert!(!format!("{args:?}").contains("sk_test_123"));
        assert!(args.provider().is_ok());
    }

    #[test]
    fn test_invalid_provider_url() {
        let args = GlobalArgs::new("not a url".to_string(), SecretString::from("sk"));
        assert!(args.provider().is_err());
    }
}
