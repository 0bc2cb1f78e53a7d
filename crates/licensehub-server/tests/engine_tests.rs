//! Activation engine tests: generation, validation, seat contention,
//! reclamation, and renewal.

use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use tokio::task::JoinSet;

use licensehub_codec::LicenseCodec;
use licensehub_core::config::EngineConfig;
use licensehub_core::error::ErrorKind;
use licensehub_core::types::id::{FeatureId, ProductId};
use licensehub_crypto::LicensingSecrets;
use licensehub_entity::{FeatureDef, License, LicenseStatus, LicenseType, Product};
use licensehub_server::{
    ActivationEngine, ActivationResult, DeactivationResult, FeatureGrant, GenerateRequest,
    LicenseStore, MemoryLicenseStore, ReclamationService, RenewalResult, ValidationResult,
};

fn secrets() -> Arc<LicensingSecrets> {
    static SECRETS: OnceLock<Arc<LicensingSecrets>> = OnceLock::new();
    SECRETS
        .get_or_init(|| Arc::new(LicensingSecrets::generate(2048).unwrap()))
        .clone()
}

struct Fixture {
    store: Arc<MemoryLicenseStore>,
    engine: ActivationEngine,
    product_id: ProductId,
    reports_feature: FeatureId,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryLicenseStore::new());
    let product_id = ProductId::new();
    let reports_feature = FeatureId::new();

    store
        .add_product(Product {
            id: product_id,
            name: "FileHub Enterprise".to_string(),
        })
        .await;
    store
        .add_feature_def(FeatureDef {
            id: reports_feature,
            name: "Reports".to_string(),
        })
        .await;

    let engine = ActivationEngine::new(store.clone(), secrets());

    Fixture {
        store,
        engine,
        product_id,
        reports_feature,
    }
}

/// Extract the license key from a generated envelope.
fn key_of(envelope: &[u8]) -> String {
    let codec = LicenseCodec::default();
    let license = codec.decode(envelope, secrets().public_key()).unwrap();
    license.license_key().to_string()
}

#[tokio::test]
async fn generate_emits_a_decodable_envelope_with_features() {
    let f = fixture().await;

    let mut request = GenerateRequest::new(
        f.product_id,
        LicenseType::Standard,
        "John Doe",
        "Acme",
    );
    request.expiration_date = Some(Utc::now() + Duration::days(30));
    request.features = vec![FeatureGrant {
        feature_id: f.reports_feature,
        enabled: true,
    }];

    let envelope = f.engine.generate(request).await.unwrap();
    let license = LicenseCodec::default()
        .decode(&envelope, secrets().public_key())
        .unwrap();

    assert_eq!(license.license_type(), LicenseType::Standard);
    assert_eq!(license.user_name(), Some("John Doe"));
    assert!(license.info().features["Reports"].is_enabled());

    // The persisted row mirrors the envelope.
    let record = f
        .store
        .find_license_by_key(license.license_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.id, license.info().license_id);
    assert_eq!(record.status, LicenseStatus::Active);
}

#[tokio::test]
async fn generate_rejects_unknown_product_and_feature() {
    let f = fixture().await;

    let request = GenerateRequest::new(
        ProductId::new(),
        LicenseType::Standard,
        "John Doe",
        "Acme",
    );
    let err = f.engine.generate(request).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadRequest);

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Standard, "John Doe", "Acme");
    request.features = vec![FeatureGrant {
        feature_id: FeatureId::new(),
        enabled: true,
    }];
    let err = f.engine.generate(request).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn generate_rejects_past_expiration() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Standard, "John Doe", "Acme");
    request.expiration_date = Some(Utc::now() - Duration::days(1));

    let err = f.engine.generate(request).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn validate_unknown_key_is_not_found() {
    let f = fixture().await;
    let result = f.engine.validate("NO-SUCH-KEY", None, None).await.unwrap();
    assert_eq!(result, ValidationResult::NotFound);
}

#[tokio::test]
async fn expired_license_is_marked_and_persisted() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Standard, "John Doe", "Acme");
    request.expiration_date = Some(Utc::now() + Duration::days(30));
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    // Age the row past its expiry.
    let mut record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    record.expiration_date = Some(Utc::now() - Duration::seconds(5));
    f.store.update_license(&record).await.unwrap();

    let result = f.engine.validate(&key, None, None).await.unwrap();
    assert_eq!(result, ValidationResult::Expired);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.status, LicenseStatus::Expired);

    // Expired stays expired on re-validation.
    let result = f.engine.validate(&key, None, None).await.unwrap();
    assert_eq!(result, ValidationResult::Expired);
}

#[tokio::test]
async fn validate_cross_checks_the_envelope() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(3);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    // Genuine envelope passes.
    let result = f.engine.validate(&key, Some(&envelope), None).await.unwrap();
    assert_eq!(result, ValidationResult::Valid);

    // An envelope for a different license fails the id cross-check.
    let mut other = GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    other.max_active_users_count = Some(3);
    let other_envelope = f.engine.generate(other).await.unwrap();

    let result = f
        .engine
        .validate(&key, Some(&other_envelope), None)
        .await
        .unwrap();
    assert!(matches!(
        result,
        ValidationResult::Invalid { kind: ErrorKind::InvalidFormat, .. }
    ));

    // Garbage bytes fail decoding outright.
    let result = f.engine.validate(&key, Some(&[1, 2, 3]), None).await.unwrap();
    assert!(matches!(result, ValidationResult::Invalid { .. }));
}

#[tokio::test]
async fn seat_contention_admits_exactly_the_cap() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(3);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    let mut results = Vec::new();
    for i in 0..5 {
        let result = f
            .engine
            .activate(&key, Some(&format!("machine-{i}")))
            .await
            .unwrap();
        results.push(result);
    }

    let granted = results
        .iter()
        .filter(|r| matches!(r, ActivationResult::Activated))
        .count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, ActivationResult::MaximumActivationsReached))
        .count();

    assert_eq!(granted, 3);
    assert_eq!(refused, 2);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.active_users_count, Some(3));
    assert_eq!(f.store.count_activations(record.id).await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn parallel_seat_contention_never_overshoots() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(5);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = Arc::new(key_of(&envelope));

    let mut tasks = JoinSet::new();
    for i in 0..50 {
        let engine = f.engine.clone();
        let key = key.clone();
        tasks.spawn(async move {
            engine
                .activate(&key, Some(&format!("machine-{i}")))
                .await
                .unwrap()
        });
    }

    let mut granted = 0;
    let mut refused = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            ActivationResult::Activated => granted += 1,
            ActivationResult::MaximumActivationsReached => refused += 1,
            other => panic!("unexpected activation result: {other:?}"),
        }
    }

    assert_eq!(granted, 5);
    assert_eq!(refused, 45);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.active_users_count, Some(5));
    assert_eq!(f.store.count_activations(record.id).await.unwrap(), 5);
}

#[tokio::test]
async fn reactivation_from_the_same_machine_keeps_one_seat() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(2);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    for _ in 0..3 {
        let result = f.engine.activate(&key, Some("machine-a")).await.unwrap();
        assert_eq!(result, ActivationResult::Activated);
    }

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(f.store.count_activations(record.id).await.unwrap(), 1);
}

#[tokio::test]
async fn revoke_releases_a_seat_and_reports_unknown_machines() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(2);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    f.engine.activate(&key, Some("machine-a")).await.unwrap();
    f.engine.activate(&key, Some("machine-b")).await.unwrap();

    let result = f.engine.revoke(&key, Some("machine-a")).await.unwrap();
    assert_eq!(result, DeactivationResult::Deactivated);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.active_users_count, Some(1));

    let result = f.engine.revoke(&key, Some("machine-zz")).await.unwrap();
    assert_eq!(result, DeactivationResult::NotFound);
}

#[tokio::test]
async fn revoke_is_terminal_for_standard_licenses() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Standard, "John Doe", "Acme");
    request.expiration_date = Some(Utc::now() + Duration::days(30));
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    let result = f.engine.revoke(&key, None).await.unwrap();
    assert_eq!(result, DeactivationResult::Deactivated);

    let result = f.engine.validate(&key, None, None).await.unwrap();
    assert_eq!(result, ValidationResult::Revoked);

    let result = f.engine.activate(&key, None).await.unwrap();
    assert_eq!(
        result,
        ActivationResult::Rejected(ValidationResult::Revoked)
    );
}

#[tokio::test]
async fn node_locked_revocation_clears_the_binding() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::NodeLocked, "John Doe", "Acme");
    request.hardware_id = Some("HW-AAA".to_string());
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    f.engine.revoke(&key, None).await.unwrap();

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.hardware_id, None);
    assert_eq!(record.status, LicenseStatus::Revoked);
}

#[tokio::test]
async fn disconnect_rejects_non_concurrent_variants() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Floating, "ops", "Acme");
    request.max_active_users_count = Some(2);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    let err = f
        .engine
        .disconnect_concurrent(&key, Some("machine-a"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFormat);
}

#[tokio::test]
async fn heartbeat_touches_only_existing_activations() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(2);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    assert!(!f.engine.heartbeat(&key, "machine-a").await.unwrap());

    f.engine.activate(&key, Some("machine-a")).await.unwrap();

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    let before = f
        .store
        .find_activation(record.id, "machine-a")
        .await
        .unwrap()
        .unwrap();

    assert!(f.engine.heartbeat(&key, "machine-a").await.unwrap());

    let after = f
        .store
        .find_activation(record.id, "machine-a")
        .await
        .unwrap()
        .unwrap();
    assert!(after.last_heartbeat_at >= before.last_heartbeat_at);
}

#[tokio::test]
async fn reclamation_removes_silent_activations() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(2);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    f.engine.activate(&key, Some("m1")).await.unwrap();
    f.engine.activate(&key, Some("m2")).await.unwrap();

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.active_users_count, Some(2));

    // Silence both machines for an hour.
    for machine in ["m1", "m2"] {
        let mut activation = f
            .store
            .find_activation(record.id, machine)
            .await
            .unwrap()
            .unwrap();
        activation.last_heartbeat_at = Utc::now() - Duration::hours(1);
        f.store.insert_activation(&activation).await.unwrap();
    }

    let service = ReclamationService::new(f.store.clone(), &EngineConfig::default());
    let reclaimed = service.reclaim_once().await.unwrap();
    assert_eq!(reclaimed, 2);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.active_users_count, Some(0));
    assert_eq!(f.store.count_activations(record.id).await.unwrap(), 0);
}

#[tokio::test]
async fn reclamation_spares_machines_that_still_heartbeat() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Concurrent, "ops", "Acme");
    request.max_active_users_count = Some(2);
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    f.engine.activate(&key, Some("silent")).await.unwrap();
    f.engine.activate(&key, Some("alive")).await.unwrap();

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    let mut activation = f
        .store
        .find_activation(record.id, "silent")
        .await
        .unwrap()
        .unwrap();
    activation.last_heartbeat_at = Utc::now() - Duration::hours(1);
    f.store.insert_activation(&activation).await.unwrap();

    let service = ReclamationService::new(f.store.clone(), &EngineConfig::default());
    assert_eq!(service.reclaim_once().await.unwrap(), 1);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.active_users_count, Some(1));
    assert!(f
        .store
        .find_activation(record.id, "alive")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn subscription_renewal_extends_and_reencodes() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Subscription, "Jane", "Acme");
    request.subscription_duration = Some(Duration::days(30));
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    let current_expiry = record.subscription_expiry_date.unwrap();
    let new_expiry = current_expiry + Duration::days(60);

    let result = f.engine.renew(&key, new_expiry).await.unwrap();
    let RenewalResult::Renewed { envelope } = result else {
        panic!("renewal should succeed");
    };

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(record.subscription_expiry_date, Some(new_expiry));
    assert_eq!(record.status, LicenseStatus::Active);

    // The fresh envelope mirrors the updated row.
    let license = LicenseCodec::default()
        .decode(&envelope, secrets().public_key())
        .unwrap();
    let License::Subscription(sub) = license else {
        panic!("expected a subscription envelope");
    };
    assert_eq!(sub.info.expiration_date, Some(new_expiry));
    assert_eq!(
        sub.subscription_start_date + sub.subscription_duration,
        new_expiry
    );
}

#[tokio::test]
async fn renewal_is_monotonic_and_subscription_only() {
    let f = fixture().await;

    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Subscription, "Jane", "Acme");
    request.subscription_duration = Some(Duration::days(30));
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    let current_expiry = record.subscription_expiry_date.unwrap();

    // Not beyond the current expiry.
    let result = f
        .engine
        .renew(&key, current_expiry - Duration::days(1))
        .await
        .unwrap();
    assert!(matches!(
        result,
        RenewalResult::Rejected { kind: ErrorKind::BadRequest, .. }
    ));

    // In the past.
    let result = f
        .engine
        .renew(&key, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert!(matches!(result, RenewalResult::Rejected { .. }));

    // Wrong variant.
    let mut request =
        GenerateRequest::new(f.product_id, LicenseType::Standard, "John Doe", "Acme");
    request.expiration_date = Some(Utc::now() + Duration::days(30));
    let standard_envelope = f.engine.generate(request).await.unwrap();
    let standard_key = key_of(&standard_envelope);

    let result = f
        .engine
        .renew(&standard_key, Utc::now() + Duration::days(90))
        .await
        .unwrap();
    assert!(matches!(
        result,
        RenewalResult::Rejected { kind: ErrorKind::BadRequest, .. }
    ));

    // Revoked subscriptions stay revoked.
    f.engine.revoke(&key, None).await.unwrap();
    let result = f
        .engine
        .renew(&key, Utc::now() + Duration::days(365))
        .await
        .unwrap();
    assert!(matches!(result, RenewalResult::Rejected { .. }));
}

#[tokio::test]
async fn trial_generation_sets_the_window() {
    let f = fixture().await;

    let mut request = GenerateRequest::new(f.product_id, LicenseType::Trial, "Eval", "Acme");
    request.trial_period = Some(Duration::days(7));
    let envelope = f.engine.generate(request).await.unwrap();
    let key = key_of(&envelope);

    let record = f.store.find_license_by_key(&key).await.unwrap().unwrap();
    assert_eq!(
        record.expiration_date,
        Some(record.issued_on + Duration::days(7))
    );

    assert_eq!(
        f.engine.validate(&key, None, None).await.unwrap(),
        ValidationResult::Valid
    );
}
