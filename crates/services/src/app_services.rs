use std::sync::Arc;

use drill_core::catalog::bundled_mappings;
use drill_core::model::{AppSettings, MappingTable};
use storage::repository::Storage;

use crate::Clock;
use crate::api::{BackendClient, DisabledTransport, HttpTransport, Transport};
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::gamification::Gamification;
use crate::item_source::{CharacterLookup, ItemSource};
use crate::reporter::ProgressReporter;
use crate::sessions::{DrillService, SpeedService};

/// Where the active mapping table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOrigin {
    /// Served by the backend or its cached copy.
    Backend,
    /// Backend unavailable; the table compiled into the binary.
    Bundled,
}

/// Assembles app-facing services over one storage backend and transport.
#[derive(Clone)]
pub struct AppServices {
    settings: AppSettings,
    mapping_origin: MappingOrigin,
    client: Arc<BackendClient>,
    source: Arc<ItemSource>,
    drills: Arc<DrillService>,
    speed: Arc<SpeedService>,
    dashboard: Arc<DashboardService>,
    gamification: Gamification,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        settings: AppSettings,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_parts(storage, transport_for(&settings), settings, clock).await
    }

    /// Build services that keep counters and cached responses in memory.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the bundled catalog is malformed.
    pub async fn new_in_memory(
        settings: AppSettings,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        Self::from_parts(Storage::in_memory(), transport_for(&settings), settings, clock).await
    }

    /// Wire every service over explicit storage and transport.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the bundled catalog is malformed.
    pub async fn from_parts(
        storage: Storage,
        transport: Arc<dyn Transport>,
        settings: AppSettings,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let client = Arc::new(BackendClient::new(
            transport,
            Arc::clone(&storage.responses),
            clock,
        ));
        let (mappings, mapping_origin) = load_mappings(&client).await?;

        let lookup: Arc<dyn CharacterLookup> = client.clone();
        let source = Arc::new(ItemSource::new(mappings.clone(), Some(lookup), &settings)?);
        let reporter = ProgressReporter::new(client.clone());
        let gamification =
            Gamification::new(Arc::clone(&storage.kv), clock, settings.xp_per_answer());

        let drills = Arc::new(DrillService::new(
            clock,
            Arc::clone(&source),
            reporter.clone(),
            gamification.clone(),
        ));
        let speed = Arc::new(SpeedService::new(
            Arc::clone(&source),
            reporter,
            gamification.clone(),
            settings.speed_durations(),
        ));
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&client), mappings));

        Ok(Self {
            settings,
            mapping_origin,
            client,
            source,
            drills,
            speed,
            dashboard,
            gamification,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    #[must_use]
    pub fn mapping_origin(&self) -> MappingOrigin {
        self.mapping_origin
    }

    #[must_use]
    pub fn mappings(&self) -> &MappingTable {
        self.source.mappings()
    }

    #[must_use]
    pub fn client(&self) -> Arc<BackendClient> {
        Arc::clone(&self.client)
    }

    #[must_use]
    pub fn drills(&self) -> Arc<DrillService> {
        Arc::clone(&self.drills)
    }

    #[must_use]
    pub fn speed(&self) -> Arc<SpeedService> {
        Arc::clone(&self.speed)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn gamification(&self) -> &Gamification {
        &self.gamification
    }
}

fn transport_for(settings: &AppSettings) -> Arc<dyn Transport> {
    match settings.api_base_url() {
        Some(url) => Arc::new(HttpTransport::new(url)),
        None => Arc::new(DisabledTransport),
    }
}

async fn load_mappings(
    client: &BackendClient,
) -> Result<(MappingTable, MappingOrigin), AppServicesError> {
    match client.mappings().await {
        Ok(table) if table.sound_count() > 0 => Ok((table, MappingOrigin::Backend)),
        Ok(_) => {
            tracing::warn!("backend mapping table is empty, using bundled table");
            Ok((bundled_mappings()?, MappingOrigin::Bundled))
        }
        Err(err) => {
            tracing::info!(error = %err, "mappings unavailable, using bundled table");
            Ok((bundled_mappings()?, MappingOrigin::Bundled))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MAPPINGS_PATH;
    use crate::sessions::PhaseRequest;
    use crate::test_support::StubTransport;
    use drill_core::time::fixed_clock;

    #[tokio::test]
    async fn offline_services_use_bundled_mappings() {
        let services = AppServices::new_in_memory(AppSettings::default(), fixed_clock())
            .await
            .unwrap();
        assert_eq!(services.mapping_origin(), MappingOrigin::Bundled);
        assert_eq!(services.mappings().initials.len(), 21);
        assert_eq!(services.speed().durations(), &[30, 60, 120]);

        let session = services.drills().start(&PhaseRequest::Words).await.unwrap();
        assert_eq!(session.total_items(), 20);
    }

    #[tokio::test]
    async fn backend_mappings_take_precedence() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            MAPPINGS_PATH,
            r#"{"initials":[{"pinyin":"b","zhuyin":"ㄅ","group":"labial"}],"finals":[{"pinyin":"a","zhuyin":"ㄚ","group":"simple"}]}"#,
        );
        let services = AppServices::from_parts(
            Storage::in_memory(),
            stub,
            AppSettings::default(),
            fixed_clock(),
        )
        .await
        .unwrap();

        assert_eq!(services.mapping_origin(), MappingOrigin::Backend);
        assert_eq!(services.mappings().sound_count(), 2);
    }

    #[tokio::test]
    async fn counters_share_one_store() {
        let services = AppServices::new_in_memory(AppSettings::default(), fixed_clock())
            .await
            .unwrap();
        assert_eq!(services.gamification().record_visit().await.unwrap(), 1);
        assert_eq!(services.gamification().add_xp(5).await.unwrap(), 5);
        assert_eq!(services.gamification().xp().await.unwrap(), 5);
    }
}
