//! Module declaration and lifecycle
//!
//! The host builds the module with its typed config, runs migrations, then
//! calls [`ContentServiceModule::init`] with the shared connection. After
//! that the native client and the REST router are available.

use crate::api::native::NativeClient;
use crate::config::Config;
use crate::contract::ContentApi;
use crate::domain::{Service, TracingEventPublisher};
use crate::infra::storage::{migrations::Migrator, repositories};
use anyhow::Result;
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// Content service module
pub struct ContentServiceModule {
    config: Config,
    service: RwLock<Option<Arc<Service>>>,
}

impl Default for ContentServiceModule {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ContentServiceModule {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            service: RwLock::new(None),
        }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self, db: &DatabaseConnection) -> Result<()> {
        Migrator::up(db, None).await?;
        tracing::info!("Content service migrations completed");
        Ok(())
    }

    /// Wire repositories, collaborators and the domain service
    pub async fn init(&self, db: Arc<DatabaseConnection>) -> Result<()> {
        let config = self.config.clone();
        let service = Service::new(repositories::repositories(db), Arc::new(TracingEventPublisher))
            .with_config(config);
        *self.service.write() = Some(Arc::new(service));

        tracing::info!("Content service initialized");
        Ok(())
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other modules
    pub fn client(&self) -> Result<Arc<dyn ContentApi>> {
        Ok(Arc::new(NativeClient::new(self.service()?)))
    }

    /// REST routes mounted on `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let service = self.service()?;
        tracing::info!("Registering content service REST routes");
        Ok(crate::api::rest::register_routes(router, service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_before_init() {
        let module = ContentServiceModule::default();
        assert!(module.service().is_err());
        assert!(module.client().is_err());
        assert!(module.register_rest(axum::Router::new()).is_err());
    }

    #[tokio::test]
    async fn test_migrate_applies_every_migration_once() {
        let db = crate::infra::storage::connect("sqlite::memory:", 1).await.unwrap();
        let module = ContentServiceModule::default();
        module.migrate(&db).await.unwrap();

        let applied = Migrator::get_applied_migrations(&db).await.unwrap();
        let mut names: Vec<String> = applied.iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names.len(), 4);
        names.dedup();
        assert_eq!(names.len(), 4);
        assert_eq!(names[0], "m20250301_000001_create_content");

        module.migrate(&db).await.unwrap();
        assert_eq!(Migrator::get_applied_migrations(&db).await.unwrap().len(), 4);
    }
}
