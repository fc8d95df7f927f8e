use guardian_rust_session::{MemoryStore, Session, SessionRepository, UserProfile};
use async_trait::async_trait;
use guardian_rust_sos::{
    BulkSmsGateway, Coordinates, DeniedLocation, Dispatch, FixedLocation, HardwareKey,
    LocationProvider, Permission, Precondition, PressConfig, SosError, SosTrigger, TriggerSource,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DHAKA: Coordinates = Coordinates {
    latitude: 23.8103,
    longitude: 90.4125,
};

async fn repository(contact: Option<&str>) -> SessionRepository {
    let repo = SessionRepository::new(Arc::new(MemoryStore::new()));
    let profile = UserProfile {
        name: "Ayesha".to_string(),
        email: "ayesha@example.com".to_string(),
        emergency_contact: contact.map(str::to_string),
        ..Default::default()
    };
    repo.save(&Session::new("token", profile)).await.unwrap();
    repo
}

fn trigger(server: &MockServer, repo: SessionRepository, config: PressConfig) -> SosTrigger {
    let gateway = BulkSmsGateway::new(
        &format!("{}/api.php", server.uri()),
        "provider-token",
        reqwest::Client::new(),
    )
    .unwrap();
    SosTrigger::new(repo, Arc::new(gateway), config)
}

/// Grants permission but never reports a position
struct SilentLocation;

#[async_trait]
impl LocationProvider for SilentLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self) -> guardian_rust_sos::Result<Coordinates> {
        std::future::pending().await
    }
}

async fn mount_ok(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/api.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ok")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_sos_composes_map_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api.php"))
        .and(body_string_contains("to=%2B8801234567"))
        .and(body_string_contains(
            "https%3A%2F%2Fwww.google.com%2Fmaps%3Fq%3D23.8103%2C90.4125",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default());
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    let sent = sos.send_sos().await.unwrap();
    assert_eq!(sent.alert.recipient, "+8801234567");
    assert!(sent
        .alert
        .message
        .contains("https://www.google.com/maps?q=23.8103,90.4125"));
    assert_eq!(sent.receipt.body, "ok");
}

#[tokio::test]
async fn test_no_fix_never_calls_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default());
    assert!(matches!(
        sos.mount(&DeniedLocation).await,
        Err(SosError::PermissionDenied)
    ));
    // contact still loaded
    assert_eq!(sos.emergency_contact().await.as_deref(), Some("+8801234567"));

    assert!(matches!(
        sos.send_sos().await,
        Err(SosError::PreconditionMissing(Precondition::Location))
    ));
}

#[tokio::test]
async fn test_location_checked_before_contact() {
    let server = MockServer::start().await;
    let sos = trigger(&server, repository(None).await, PressConfig::default());

    let _ = sos.mount(&DeniedLocation).await;
    assert!(matches!(
        sos.send_sos().await,
        Err(SosError::PreconditionMissing(Precondition::Location))
    ));
}

#[tokio::test]
async fn test_missing_contact_never_calls_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sos = trigger(&server, repository(None).await, PressConfig::default());
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    assert!(matches!(
        sos.send_sos().await,
        Err(SosError::PreconditionMissing(Precondition::EmergencyContact))
    ));
}

#[tokio::test]
async fn test_gateway_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default());
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    assert!(matches!(
        sos.send_sos().await,
        Err(SosError::GatewayError { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_repeated_sends_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default());
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    sos.activate(TriggerSource::Button).await.unwrap();
    sos.activate(TriggerSource::Button).await.unwrap();
}

#[tokio::test]
async fn test_same_source_is_debounced_while_in_flight() {
    let server = MockServer::start().await;
    mount_ok(&server, Duration::from_millis(200)).await;

    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default());
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    let (first, second) = tokio::join!(
        sos.activate(TriggerSource::Button),
        sos.activate(TriggerSource::Button)
    );
    assert!(matches!(first.unwrap(), Dispatch::Sent(_)));
    assert_eq!(second.unwrap(), Dispatch::InFlight);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sources_are_debounced_independently() {
    let server = MockServer::start().await;
    mount_ok(&server, Duration::from_millis(200)).await;

    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default());
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    let (button, keys) = tokio::join!(
        sos.activate(TriggerSource::Button),
        sos.activate(TriggerSource::HardwareKeys)
    );
    assert!(matches!(button.unwrap(), Dispatch::Sent(_)));
    assert!(matches!(keys.unwrap(), Dispatch::Sent(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_triple_press_within_window_sends_once() {
    let server = MockServer::start().await;
    mount_ok(&server, Duration::ZERO).await;

    let config = PressConfig::default().with_window(Duration::from_secs(5));
    let sos = trigger(&server, repository(Some("+8801234567")).await, config);
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    let t0 = Instant::now();
    let mut dispatched = 0;
    for offset in [0, 1, 2] {
        let at = t0 + Duration::from_secs(offset);
        if let Some(dispatch) = sos.record_press(HardwareKey::VolumeDown, at).await.unwrap() {
            assert!(matches!(dispatch, Dispatch::Sent(_)));
            dispatched += 1;
        }
    }

    assert_eq!(dispatched, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_spread_out_presses_never_send() {
    let server = MockServer::start().await;
    mount_ok(&server, Duration::ZERO).await;

    let config = PressConfig::default().with_window(Duration::from_secs(5));
    let sos = trigger(&server, repository(Some("+8801234567")).await, config);
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    let t0 = Instant::now();
    for offset in [0, 6, 7] {
        let at = t0 + Duration::from_secs(offset);
        assert!(sos
            .record_press(HardwareKey::VolumeDown, at)
            .await
            .unwrap()
            .is_none());
    }

    assert_eq!(sos.pending_presses(t0 + Duration::from_secs(7)).await, 2);
    assert_eq!(sos.pending_presses(t0 + Duration::from_secs(20)).await, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unmount_drops_late_result() {
    let server = MockServer::start().await;
    mount_ok(&server, Duration::from_secs(5)).await;

    let sos = Arc::new(trigger(
        &server,
        repository(Some("+8801234567")).await,
        PressConfig::default(),
    ));
    sos.mount(&FixedLocation(DHAKA)).await.unwrap();

    let pending = {
        let sos = sos.clone();
        tokio::spawn(async move { sos.activate(TriggerSource::Button).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    sos.unmount();

    let outcome = pending.await.unwrap();
    assert!(matches!(outcome, Err(SosError::Cancelled)));
    assert!(!sos.is_mounted());
    assert!(matches!(sos.send_sos().await, Err(SosError::Cancelled)));
}

#[tokio::test]
async fn test_fix_timeout_reports_location_error() {
    let server = MockServer::start().await;
    let sos = trigger(&server, repository(Some("+8801234567")).await, PressConfig::default())
        .with_fix_timeout(Duration::from_millis(50));

    assert!(matches!(
        sos.mount(&SilentLocation).await,
        Err(SosError::LocationError(_))
    ));
    assert_eq!(sos.emergency_contact().await.as_deref(), Some("+8801234567"));
    assert!(matches!(
        sos.send_sos().await,
        Err(SosError::PreconditionMissing(Precondition::Location))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}
