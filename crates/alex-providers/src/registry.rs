//! Holds instantiated providers and resolves which one serves a given
//! cortex role (flash / pro / engineer / embeddings).

use crate::anthropic::AnthropicProvider;
use crate::google::GoogleProvider;
use crate::traits::LlmProvider;
use alex_domain::{Config, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    roles: HashMap<String, String>,
}

impl ProviderRegistry {
    /// Builds the registry from config: a Google provider for flash/pro/
    /// embeddings, and an Anthropic provider for the engineer cortex.
    /// Providers that fail to initialize (missing API key) are skipped and
    /// logged rather than aborting startup, matching the teacher's
    /// allow-partial-init policy.
    pub fn from_config(config: &Config) -> Self {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        let mut roles = HashMap::new();

        match GoogleProvider::from_env(config.model.flash_model.clone()) {
            Ok(p) => {
                providers.insert("google".to_string(), Arc::new(p));
                roles.insert("flash".to_string(), "google".to_string());
                roles.insert("pro".to_string(), "google".to_string());
                roles.insert("embeddings".to_string(), "google".to_string());
            }
            Err(e) => tracing::warn!(error = %e, "google provider unavailable"),
        }

        match AnthropicProvider::from_env("claude-sonnet-4-20250514") {
            Ok(p) => {
                providers.insert("anthropic".to_string(), Arc::new(p));
                roles.insert("engineer".to_string(), "anthropic".to_string());
            }
            Err(e) => tracing::warn!(error = %e, "anthropic provider unavailable"),
        }

        Self { providers, roles }
    }

    pub fn for_role(&self, role: &str) -> Result<Arc<dyn LlmProvider>> {
        let provider_id = self.roles.get(role).ok_or_else(|| {
            Error::Config(format!("no provider configured for role '{role}'"))
        })?;
        self.providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| Error::Config(format!("provider '{provider_id}' not initialized")))
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }
}
