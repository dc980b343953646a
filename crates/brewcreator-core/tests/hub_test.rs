// End-to-end tests for the BrewCreator facade against wiremock: fleet
// fetch with linkage resolution, the partial-update write path, and
// realtime lifecycle errors surfacing as core errors.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brewcreator_api::{RetryPolicy, ServiceEndpoints};
use brewcreator_core::{
    AccountCredentials, BatchInfoUpdate, BrewCreator, BrewCreatorConfig, CoreError, Equipment,
    EquipmentId, FerminatorMode, MemoryTokenStore, StoredTokens, TiltColor,
};

fn fresh_tokens() -> StoredTokens {
    StoredTokens {
        access_token: Some("tok-1".into()),
        refresh_token: None,
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
    }
}

fn hub(server: &MockServer) -> BrewCreator {
    let base = Url::parse(&server.uri()).unwrap();
    let mut ws_url = base.clone();
    ws_url.set_scheme("ws").unwrap();

    let config = BrewCreatorConfig::new(AccountCredentials::new("brewer@example.com", "hunter2"))
        .with_endpoints(ServiceEndpoints {
            api_url: base.clone(),
            identity_url: base,
            ws_url,
        })
        .with_retry(RetryPolicy {
            attempts: 2,
            delay: Duration::ZERO,
        });

    BrewCreator::new(
        config,
        Arc::new(MemoryTokenStore::with_tokens(fresh_tokens())),
    )
    .unwrap()
}

#[tokio::test]
async fn list_equipment_builds_linked_directory() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1.0/equipments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "ferm-1",
                    "iotHubBrewEquipmentId": "FRM-0042",
                    "iotHubBrewEquipmentGroupId": "Ferminator",
                    "name": "Cellar Ferminator",
                    "isConnected": true,
                    "actualTemperature": 21.0,
                    "setTemperature": 19.0,
                    "lProcess": "Cooling",
                    "connectedEquipments": ["tilt-1", "tilt-2"],
                },
                {
                    "id": "tilt-1",
                    "iotHubBrewEquipmentGroupId": "Tilt",
                    "name": "Tilt Green",
                    "color": "TiltGreen",
                    "actualTemperature": 18.3,
                    "sg": 1.020,
                    "isLoggingData": true,
                },
                {
                    "id": "tilt-2",
                    "iotHubBrewEquipmentGroupId": "Tilt",
                    "name": "Tilt Red",
                    "color": "TiltRed",
                    "actualTemperature": 24.9,
                    "isLoggingData": false,
                },
                {
                    "id": "mystery-1",
                    "iotHubBrewEquipmentGroupId": "Kegerator",
                },
            ]
        })))
        .mount(&server)
        .await;

    let hub = hub(&server);
    let directory = hub.list_equipment().await.unwrap();

    // The unknown kind is dropped, everything else survives.
    assert_eq!(directory.len(), 3);
    assert_eq!(directory.ferminators().count(), 1);
    assert_eq!(directory.tilts().count(), 2);

    let ferminator = directory
        .get(&EquipmentId::new("ferm-1"))
        .and_then(Equipment::as_ferminator)
        .unwrap();
    assert_eq!(ferminator.mode, Some(FerminatorMode::Cooling));

    // Linkage resolved to the logging probe, and the effective
    // temperature follows it.
    let linked = ferminator.linked_tilt.as_ref().unwrap();
    assert_eq!(linked.id, EquipmentId::new("tilt-1"));
    assert_eq!(linked.color, Some(TiltColor::Green));
    assert_eq!(ferminator.actual_temperature(), Some(18.3));
    assert_eq!(ferminator.actual_temperature_builtin_probe(), Some(21.0));
}

#[tokio::test]
async fn write_operations_send_partial_payloads() {
    let server = MockServer::start().await;
    let id = EquipmentId::new("ferm-1");

    Mock::given(method("PUT"))
        .and(path("/api/v1.0/equipments/ferm-1"))
        .and(body_json(json!({ "setTemperature": 18.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v1.0/equipments/ferm-1"))
        .and(body_json(json!({ "fanSpeed": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v1.0/equipments/ferm-1"))
        .and(body_json(json!({ "isRegulatingTemperature": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": false })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v1.0/equipments/ferm-1"))
        .and(body_json(json!({ "isLoggingData": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(&server)
        .await;

    let hub = hub(&server);
    assert!(hub.set_target_temperature(&id, 18.5).await.unwrap());
    assert!(hub.set_fan_speed(&id, 3).await.unwrap());
    // The server's own flag is passed through, not assumed.
    assert!(!hub.set_regulating_temperature(&id, false).await.unwrap());
    assert!(hub.set_logging_data(&id, true).await.unwrap());
}

#[tokio::test]
async fn batch_info_update_nests_only_set_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1.0/equipments/ferm-1"))
        .and(body_json(json!({
            "batchInfo": {
                "brewName": "Saison d'Été",
                "og": 1.054,
                "fermentationType": "Top",
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(&server)
        .await;

    let hub = hub(&server);
    let update = BatchInfoUpdate {
        brew_name: Some("Saison d'Été".into()),
        original_gravity: Some(1.054),
        fermentation_type: Some(brewcreator_core::FermentationType::Top),
        ..BatchInfoUpdate::default()
    };
    assert!(
        hub.set_batch_info(&EquipmentId::new("ferm-1"), &update)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn api_failures_surface_as_core_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1.0/equipments"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let hub = hub(&server);
    let err = hub.list_equipment().await.unwrap_err();
    assert!(
        matches!(
            err,
            CoreError::Api {
                status: Some(403),
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn double_realtime_start_is_rejected_and_stop_is_idempotent() {
    let server = MockServer::start().await;
    // No realtime endpoints mounted: the supervisor will fail its first
    // connect and sit in the cooldown, which is all this test needs.
    let hub = hub(&server);

    hub.start_realtime(|_directory| async {}).await.unwrap();
    assert!(hub.realtime_running().await);

    let err = hub.start_realtime(|_directory| async {}).await.unwrap_err();
    assert!(matches!(err, CoreError::RealtimeAlreadyRunning), "got {err:?}");

    hub.stop_realtime().await;
    assert!(!hub.realtime_running().await);
    hub.stop_realtime().await;
    hub.close().await;
}
