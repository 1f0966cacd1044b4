//! Model catalog and the model chosen for the next send.

use tracing::{debug, warn};

use crate::api::{ChatBackend, EndpointModels};
use crate::core::error::{ApiError, ModelSelectionError};

/// Used when the catalog could not be loaded.
pub const FALLBACK_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Default)]
pub struct ModelSelection {
    catalog: Vec<ModelChoice>,
    selected: Option<ModelChoice>,
    preferred: Option<String>,
}

impl ModelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model picked by [`apply_catalog`](Self::apply_catalog) when nothing is
    /// selected yet and the catalog offers it.
    pub fn with_preferred(preferred: Option<String>) -> Self {
        Self {
            preferred: preferred.filter(|name| !name.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> &[ModelChoice] {
        &self.catalog
    }

    pub fn selected(&self) -> Option<&ModelChoice> {
        self.selected.as_ref()
    }

    /// Name sent with the next exchange.
    pub fn active_model(&self) -> &str {
        self.selected
            .as_ref()
            .map(|choice| choice.model.as_str())
            .unwrap_or(FALLBACK_MODEL)
    }

    pub async fn load_catalog(&mut self, backend: &dyn ChatBackend) -> Result<(), ApiError> {
        match backend.fetch_catalog().await {
            Ok(endpoints) => {
                self.apply_catalog(endpoints);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to fetch model catalog");
                Err(err)
            }
        }
    }

    /// Flattens provider→models into (model, provider) pairs in catalog order.
    pub fn apply_catalog(&mut self, endpoints: Vec<EndpointModels>) {
        self.catalog = endpoints
            .into_iter()
            .flat_map(|endpoint| {
                let provider = endpoint.provider;
                endpoint.models.into_iter().map(move |model| ModelChoice {
                    model,
                    provider: provider.clone(),
                })
            })
            .collect();
        debug!(models = self.catalog.len(), "Model catalog loaded");

        if self.selected.is_none() {
            let preferred = self
                .preferred
                .as_deref()
                .and_then(|name| self.find(name).cloned());
            self.selected = preferred.or_else(|| self.catalog.first().cloned());
        }
    }

    pub fn select(&mut self, model_name: &str) -> Result<&ModelChoice, ModelSelectionError> {
        let choice = self
            .find(model_name.trim())
            .cloned()
            .ok_or_else(|| ModelSelectionError::UnknownModel(model_name.trim().to_string()))?;
        debug!(model = %choice.model, provider = %choice.provider, "Model selected");
        Ok(self.selected.insert(choice))
    }

    fn find(&self, model_name: &str) -> Option<&ModelChoice> {
        self.catalog
            .iter()
            .find(|choice| choice.model == model_name)
            .or_else(|| {
                self.catalog
                    .iter()
                    .find(|choice| choice.model.eq_ignore_ascii_case(model_name))
            })
    }
}
