use anyhow::{Context, Result};
use govern_runtime::{BackendRegistry, InferenceAdapter};

use super::load_config;
use crate::output;

pub async fn execute(config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let backend = BackendRegistry::with_defaults().create(&config.backend)?;
    let adapter = InferenceAdapter::new(backend, &config);

    let models = adapter
        .list_models()
        .await
        .with_context(|| format!("Could not list models from {}", config.backend.base_url))?;

    output::print_models(&models, adapter.model());
    Ok(())
}
