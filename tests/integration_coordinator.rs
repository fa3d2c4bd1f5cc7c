//! Integration tests for the update coordinator.
use crate::mockserver_livoltek::{LivoltekMockServer, SITE_ID, USER_TOKEN, credential, noon_millis};
use chrono::{Days, Local};
use livoltek_bridge::integration::livoltek::{self, ClientFactory, HttpClient};
use livoltek_bridge::services::coordinator::Error;
use livoltek_bridge::services::sensors::{SensorKey, sensor_values};
use livoltek_bridge::services::{Coordinator, CoordinatorState, LivoltekSettings};
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;


#[fixture]
async fn mockserver() -> LivoltekMockServer {
    LivoltekMockServer::start().await
}

fn coordinator(mockserver: &LivoltekMockServer, device_timeout: Duration) -> Coordinator {
    let http = HttpClient::new(Duration::from_secs(5)).expect("cannot create http client");
    let factory = ClientFactory::new(Arc::new(http)).with_endpoint(mockserver.url());
    let settings = LivoltekSettings {
        credential: credential(),
        user_token: USER_TOKEN.to_string(),
        site_id: SITE_ID.to_string(),
        device_timeout,
    };
    Coordinator::new(Arc::new(factory), settings)
}

#[rstest]
#[tokio::test]
async fn test_refresh(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    let today = Local::now().date_naive();
    let (login_mock, token) = mockserver.mock_login_ok().await;
    let mocks = mockserver.mock_cycle(today).await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));
    let mut snapshots = coordinator.subscribe();

    let snapshot = coordinator.refresh().await.unwrap();

    login_mock.assert_async().await;
    for mock in &mocks {
        mock.assert_async().await;
    }
    assert_eq!(coordinator.state(), CoordinatorState::Ready);
    assert_eq!(coordinator.access_token(), Some(token.as_str()));
    assert_eq!(coordinator.device_registry().len(), 1);
    let device = coordinator.device_registry().get("SN001").unwrap();
    assert_eq!(device.model.as_deref(), Some("Hyper-5000"));
    assert_eq!(device.sw_version.as_deref(), Some("V1.2.3"));

    assert!(snapshots.has_changed().unwrap());
    let observed = snapshots.borrow_and_update().clone().unwrap();
    assert!(Arc::ptr_eq(&observed, &snapshot));

    assert_eq!(snapshot.site.id, "42");
    assert_eq!(snapshot.todays_grid.as_ref().unwrap().positive, Some(4.5));
    assert_eq!(
        snapshot.todays_solar.as_ref().unwrap().power_generation,
        Some(12.5)
    );
    let value = |key| {
        sensor_values(&snapshot)
            .find(|v| v.key() == key)
            .and_then(|v| v.value)
    };
    assert_eq!(value(SensorKey::BatterySoc), Some(87.0));
    assert_eq!(value(SensorKey::PvPower), Some(3.2));
    assert_eq!(value(SensorKey::GridExportEnergy), Some(1.25));
}

#[rstest]
#[tokio::test]
async fn test_refresh_reuses_token_and_registry(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    let (login_mock, _) = mockserver.mock_login_ok().await;
    let mocks = mockserver.mock_cycle(Local::now().date_naive()).await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));

    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();

    assert_eq!(login_mock.hits_async().await, 1);
    // Site overview is read every cycle, device details only once
    assert_eq!(mocks[0].hits_async().await, 2);
    assert_eq!(mocks[2].hits_async().await, 1);
    assert_eq!(coordinator.device_registry().len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_failed_refresh_keeps_snapshot(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    mockserver.mock_login_ok().await;
    let mut mocks = mockserver.mock_cycle(Local::now().date_naive()).await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));
    let previous = coordinator.refresh().await.unwrap();

    let mut power_flow_mock = mocks.remove(3);
    power_flow_mock.delete_async().await;
    let error_mock = mockserver
        .mock_site_api_error("curPowerflow", "SYSTEM_BUSY")
        .await;

    let result = coordinator.refresh().await;

    error_mock.assert_async().await;
    assert!(matches!(
        result,
        Err(Error::UpdateFailed {
            call: "current power flow",
            ref site_id,
            source: livoltek::Error::ApiError(_),
        }) if site_id == "42"
    ));
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert!(Arc::ptr_eq(&coordinator.snapshot().unwrap(), &previous));
    assert!(coordinator.access_token().is_some());
}

#[rstest]
#[tokio::test]
async fn test_failed_site_overview_keeps_snapshot(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    mockserver.mock_login_ok().await;
    let mut mocks = mockserver.mock_cycle(Local::now().date_naive()).await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));
    let previous = coordinator.refresh().await.unwrap();
    let mut snapshots = coordinator.subscribe();

    let mut site_mock = mocks.remove(0);
    site_mock.delete_async().await;
    let error_mock = mockserver
        .mock_site_api_error("overview", "SITE_NOT_FOUND")
        .await;

    let result = coordinator.refresh().await;

    error_mock.assert_async().await;
    assert!(matches!(
        result,
        Err(Error::UpdateFailed {
            call: "site overview",
            ref site_id,
            source: livoltek::Error::ApiError(ref message),
        }) if site_id == "42" && message == "SITE_NOT_FOUND"
    ));
    // The cycle stops at the overview, power flow is not read again
    assert_eq!(mocks[2].hits_async().await, 1);
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert!(!snapshots.has_changed().unwrap());
    assert!(Arc::ptr_eq(&coordinator.snapshot().unwrap(), &previous));
    assert!(coordinator.access_token().is_some());
}

#[rstest]
#[tokio::test]
async fn test_todays_grid_independent_of_position(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    let today = Local::now().date_naive();
    let yesterday = today - Days::new(1);
    let before = today - Days::new(2);
    mockserver.mock_login_ok().await;
    mockserver.mock_site().await;
    mockserver.mock_device_list(&[]).await;
    mockserver.mock_power_flow(50.0, 0.0).await;
    mockserver
        .mock_recent_grid(&[
            (noon_millis(today), 7.5, 0.5),
            (noon_millis(yesterday), 9.0, 3.0),
            (noon_millis(before), 8.0, 2.0),
        ])
        .await;
    mockserver
        .mock_recent_solar(&[(noon_millis(yesterday), 20.0)])
        .await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));

    let snapshot = coordinator.refresh().await.unwrap();

    let grid = snapshot.todays_grid.as_ref().unwrap();
    assert_eq!(grid.positive, Some(7.5));
    assert_eq!(grid.negative, Some(0.5));
    assert_eq!(snapshot.todays_solar, None);
    assert!(coordinator.device_registry().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_device_timeout_skips_device(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    mockserver.mock_login_ok().await;
    mockserver.mock_site().await;
    mockserver.mock_device_list(&["SN001", "SN002"]).await;
    mockserver
        .mock_device_details_delayed("SN001", Duration::from_secs(2))
        .await;
    mockserver.mock_device_details("SN002").await;
    mockserver.mock_power_flow(87.0, 3.2).await;
    mockserver.mock_recent_grid(&[]).await;
    mockserver.mock_recent_solar(&[]).await;
    let mut coordinator = coordinator(&mockserver, Duration::from_millis(200));

    let snapshot = coordinator.refresh().await.unwrap();

    assert_eq!(snapshot.devices.len(), 2);
    assert!(!coordinator.device_registry().contains("SN001"));
    assert!(coordinator.device_registry().contains("SN002"));
    assert_eq!(coordinator.state(), CoordinatorState::Ready);
}

#[rstest]
#[tokio::test]
async fn test_unauthorized_clears_token(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    let (login_mock, _) = mockserver.mock_login_ok().await;
    mockserver.mock_site_unauthorized("overview").await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));

    let first = coordinator.refresh().await;
    assert!(matches!(
        first,
        Err(Error::UpdateFailed {
            call: "site overview",
            source: livoltek::Error::Unauthorized,
            ..
        })
    ));
    assert_eq!(coordinator.access_token(), None);

    let second = coordinator.refresh().await;

    assert!(second.is_err());
    assert_eq!(login_mock.hits_async().await, 2);
    assert_eq!(coordinator.snapshot(), None);
}

#[rstest]
#[tokio::test]
async fn test_authentication_failed(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    let login_mock = mockserver.mock_login_failed().await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));

    let result = coordinator.refresh().await;

    login_mock.assert_async().await;
    let error = result.err().expect("refresh should fail");
    assert!(error.is_authentication_error());
    assert!(matches!(
        error,
        Error::AuthenticationFailed { ref account_id, .. } if account_id == "X"
    ));
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert_eq!(coordinator.access_token(), None);
    assert_eq!(coordinator.snapshot(), None);
}

#[rstest]
#[tokio::test]
async fn test_list_sites(#[future] mockserver: LivoltekMockServer) {
    let mockserver = mockserver.await;
    mockserver.mock_login_ok().await;
    let sites_mock = mockserver.mock_user_sites(&["42"]).await;
    let mut coordinator = coordinator(&mockserver, Duration::from_secs(2));

    let sites = coordinator.list_sites().await.unwrap();

    sites_mock.assert_async().await;
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].id, "42");
    assert_eq!(sites[0].site_name.as_deref(), Some("Site 42"));
    assert!(coordinator.access_token().is_some());
}
