// ── BrewCreator facade ──
//
// One handle bundling the whole client: fleet reads, device writes, and
// the realtime session. Owns the api client and hands it to the realtime
// supervisor; stopping the session joins every background task, so no
// activity outlives this handle's shutdown.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use brewcreator_api::websocket::UpdateCallback;
use brewcreator_api::{BrewCreatorClient, RealtimeSession, TokenStore, TransportConfig};

use crate::config::BrewCreatorConfig;
use crate::directory::EquipmentDirectory;
use crate::error::CoreError;
use crate::model::{BatchInfoUpdate, EquipmentId};

/// The main entry point for consumers.
pub struct BrewCreator {
    client: Arc<BrewCreatorClient>,
    realtime: RealtimeSession,
}

impl BrewCreator {
    /// Build a client from configuration and a token store.
    ///
    /// Does not touch the network; the first operation (or
    /// [`verify_credentials`](Self::verify_credentials)) authenticates on
    /// demand.
    pub fn new(config: BrewCreatorConfig, store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            cookie_jar: None,
        };
        let client = Arc::new(BrewCreatorClient::new(
            config.credentials.username,
            config.credentials.password,
            store,
            config.endpoints,
            &transport,
            config.retry,
        )?);
        let realtime = RealtimeSession::new(Arc::clone(&client));
        Ok(Self { client, realtime })
    }

    /// Perform a full credential exchange and persist the result.
    ///
    /// Intended for account setup: a terminal
    /// [`InvalidCredentials`](CoreError::InvalidCredentials) means the
    /// username/password pair is wrong.
    pub async fn verify_credentials(&self) -> Result<(), CoreError> {
        self.client.tokens().authenticate().await?;
        Ok(())
    }

    // ── Fleet reads ─────────────────────────────────────────────────

    /// Fetch the fleet and build the typed directory, resolving
    /// controller-to-probe linkage within this fetch.
    pub async fn list_equipment(&self) -> Result<EquipmentDirectory, CoreError> {
        let page = self.client.equipment_page().await?;
        let directory = EquipmentDirectory::from_page(&page);
        debug!(count = directory.len(), "built equipment directory");
        Ok(directory)
    }

    /// Raw fleet listing for diagnostics dumps.
    pub async fn equipment_json(&self) -> Result<Value, CoreError> {
        Ok(self.client.equipment_json().await?)
    }

    // ── Device writes ───────────────────────────────────────────────

    /// Set a controller's target temperature (°C).
    pub async fn set_target_temperature(
        &self,
        id: &EquipmentId,
        celsius: f64,
    ) -> Result<bool, CoreError> {
        self.update(id, json!({ "setTemperature": celsius })).await
    }

    /// Set a controller's fan speed step.
    pub async fn set_fan_speed(&self, id: &EquipmentId, speed: i32) -> Result<bool, CoreError> {
        self.update(id, json!({ "fanSpeed": speed })).await
    }

    /// Enable or disable temperature regulation.
    pub async fn set_regulating_temperature(
        &self,
        id: &EquipmentId,
        regulating: bool,
    ) -> Result<bool, CoreError> {
        self.update(id, json!({ "isRegulatingTemperature": regulating }))
            .await
    }

    /// Start or stop batch data logging.
    pub async fn set_logging_data(
        &self,
        id: &EquipmentId,
        logging: bool,
    ) -> Result<bool, CoreError> {
        self.update(id, json!({ "isLoggingData": logging })).await
    }

    /// Update batch metadata; only the fields set on `update` are sent.
    pub async fn set_batch_info(
        &self,
        id: &EquipmentId,
        update: &BatchInfoUpdate,
    ) -> Result<bool, CoreError> {
        self.update(id, json!({ "batchInfo": update })).await
    }

    async fn update(&self, id: &EquipmentId, payload: Value) -> Result<bool, CoreError> {
        Ok(self.client.update_equipment(id.as_str(), &payload).await?)
    }

    // ── Realtime session ────────────────────────────────────────────

    /// Start the realtime session. On every update notification the
    /// fleet is re-fetched and `on_update` receives the fresh directory.
    ///
    /// Fails with [`CoreError::RealtimeAlreadyRunning`] while a session
    /// is active.
    pub async fn start_realtime<F, Fut>(&self, on_update: F) -> Result<(), CoreError>
    where
        F: Fn(EquipmentDirectory) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let on_update = Arc::new(on_update);
        let callback: UpdateCallback = Arc::new(move |page| {
            let on_update = Arc::clone(&on_update);
            Box::pin(async move {
                let directory = EquipmentDirectory::from_page(&page);
                on_update(directory).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        self.realtime.start(callback).await?;
        Ok(())
    }

    /// Stop the realtime session and wait for its background tasks to
    /// unwind. Idempotent.
    pub async fn stop_realtime(&self) {
        self.realtime.stop().await;
    }

    /// Whether the realtime session is currently live.
    pub async fn realtime_running(&self) -> bool {
        self.realtime.is_running().await
    }

    /// Shut down: stops the realtime session. The HTTP pool is released
    /// when the handle drops.
    pub async fn close(&self) {
        self.stop_realtime().await;
    }
}
