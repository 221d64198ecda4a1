use std::path::Path;
use std::sync::Arc;

use toml::Value;
use tracing::info;

use super::router::ContextRouter;
use super::snapshot::SnapshotService;
use crate::domain::context::Service;
use crate::shared::config::{Configuration, NAMESPACE};
use crate::shared::errors::AppError;

/// Factory for the site services registered at start-up
pub struct ServiceFactory;

impl ServiceFactory {
    /// Configuration prefix of `<site> = "<snapshot path>"` entries.
    pub fn snapshots_prefix() -> String {
        format!("{}.snapshots", NAMESPACE)
    }

    /// Build one snapshot service per configured site. Relative paths resolve against `base_dir`.
    pub fn create_services(
        configuration: &Configuration,
        base_dir: &Path,
    ) -> Result<Vec<Arc<dyn Service>>, AppError> {
        let prefix = Self::snapshots_prefix();
        let mut services: Vec<Arc<dyn Service>> = Vec::new();

        for (site, value) in configuration.subset(&prefix) {
            let path = match value {
                Value::String(path) => path,
                other => {
                    return Err(AppError::ConfigError(format!(
                        "{}.{} must be a snapshot path, got {}",
                        prefix, site, other
                    )))
                }
            };

            let path = base_dir.join(path);
            info!("Loading snapshot for {} from {}", site, path.display());
            services.push(Arc::new(SnapshotService::from_file(&site, &path)?));
        }

        Ok(services)
    }

    /// Create the routing facade over every configured site
    pub fn load(configuration: &Configuration, base_dir: &Path) -> Result<ContextRouter, AppError> {
        Ok(ContextRouter::new(Self::create_services(configuration, base_dir)?))
    }
}
