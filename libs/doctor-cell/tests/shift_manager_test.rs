// libs/doctor-cell/tests/shift_manager_test.rs
use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{ShiftError, ShiftInput};
use doctor_cell::services::shift_manager::DoctorShiftManager;
use shared_config::AppConfig;
use shared_utils::test_utils::TestConfig;

fn test_config(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_supabase_url(&mock_server.uri()).to_app_config()
}

fn shift_input(date: &str, time_range: &str) -> ShiftInput {
    ShiftInput {
        date: date.to_string(),
        time_range: time_range.to_string(),
        shift_name: None,
        status: None,
        max_appointments: None,
    }
}

fn doctor_row(doctor_id: Uuid, clinic_id: Uuid, shift_ids: &[Uuid]) -> serde_json::Value {
    json!({
        "id": doctor_id,
        "clinic_id": clinic_id,
        "name": "Dr. Test",
        "specialty": "General Practice",
        "status": "Active",
        "shift_time_ids": shift_ids,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}

fn shift_row(
    shift_id: Uuid,
    doctor_id: Uuid,
    clinic_id: Uuid,
    date: &str,
    time_range: &str,
) -> serde_json::Value {
    json!({
        "id": shift_id,
        "clinic_id": clinic_id,
        "doctor_id": doctor_id,
        "date": date,
        "shift_name": "Shift 1",
        "time_range": time_range,
        "status": "Available",
        "max_appointments": null,
        "is_active": true,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}

async fn mount_doctor(mock_server: &MockServer, doctor: &serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn upsert_rejects_bad_batch_without_writing() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();

    mount_doctor(&mock_server, &doctor_row(doctor_id, clinic_id, &[])).await;

    // The whole batch must abort before any write reaches storage
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/replace_shift_batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let manager = DoctorShiftManager::new(&test_config(&mock_server));
    let batch = vec![
        shift_input("2024-06-01", "9.00am - 10.00am"),
        shift_input("2024-06-01", "bad-format"),
    ];

    let err = manager
        .upsert_shifts(doctor_id, &batch, Some("token"))
        .await
        .unwrap_err();

    assert_matches!(err, ShiftError::InvalidTimeRange { index: 1 });
}

#[tokio::test]
async fn upsert_returns_ids_and_is_idempotent() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();
    let shift_a = Uuid::new_v4();
    let shift_b = Uuid::new_v4();

    mount_doctor(&mock_server, &doctor_row(doctor_id, clinic_id, &[])).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/replace_shift_batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([shift_a, shift_b])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/shift_times"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shift_row(shift_a, doctor_id, clinic_id, "2024-06-01", "9.00am - 10.00am"),
            shift_row(shift_b, doctor_id, clinic_id, "2024-06-01", "10.00am - 11.00am"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(body_partial_json(json!({ "shift_time_ids": [shift_a, shift_b] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_row(doctor_id, clinic_id, &[shift_a, shift_b])
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let manager = DoctorShiftManager::new(&test_config(&mock_server));
    let batch = vec![
        shift_input("2024-06-01", "9.00am - 10.00am"),
        shift_input("2024-06-01", "10.00am - 11.00am"),
    ];

    let first = manager
        .upsert_shifts(doctor_id, &batch, Some("token"))
        .await
        .expect("first upsert");
    let second = manager
        .upsert_shifts(doctor_id, &batch, Some("token"))
        .await
        .expect("second upsert");

    assert_eq!(first, vec![shift_a, shift_b]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn add_rejects_duplicate_active_shift() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();

    mount_doctor(&mock_server, &doctor_row(doctor_id, clinic_id, &[])).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/shift_times"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shift_row(Uuid::new_v4(), doctor_id, clinic_id, "2024-06-01", "9.00am - 10.00am")
        ])))
        .mount(&mock_server)
        .await;

    // The duplicate must fail the batch before any insert or list rewrite
    Mock::given(method("POST"))
        .and(path("/rest/v1/shift_times"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let manager = DoctorShiftManager::new(&test_config(&mock_server));
    let batch = vec![shift_input("2024-06-01", "9.00am - 10.00am")];

    let err = manager
        .add_shifts(doctor_id, &batch, Some("token"))
        .await
        .unwrap_err();

    assert_matches!(err, ShiftError::DuplicateShift { .. });
}

#[tokio::test]
async fn add_creates_fresh_rows_and_resyncs_list() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();
    let new_shift = Uuid::new_v4();

    mount_doctor(&mock_server, &doctor_row(doctor_id, clinic_id, &[])).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/shift_times"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/shift_times"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            shift_row(new_shift, doctor_id, clinic_id, "2024-06-02", "1.00pm - 5.00pm")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Resync reads the active set back and overwrites the doctor's list
    Mock::given(method("GET"))
        .and(path("/rest/v1/shift_times"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shift_row(new_shift, doctor_id, clinic_id, "2024-06-02", "1.00pm - 5.00pm")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(body_partial_json(json!({ "shift_time_ids": [new_shift] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_row(doctor_id, clinic_id, &[new_shift])
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = DoctorShiftManager::new(&test_config(&mock_server));
    let batch = vec![shift_input("2024-06-02", "1.00pm - 5.00pm")];

    let ids = manager
        .add_shifts(doctor_id, &batch, Some("token"))
        .await
        .expect("add shifts");

    assert_eq!(ids, vec![new_shift]);
}

#[tokio::test]
async fn remove_is_scoped_to_the_doctor() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();
    let kept = Uuid::new_v4();
    let removed = Uuid::new_v4();

    mount_doctor(&mock_server, &doctor_row(doctor_id, clinic_id, &[kept, removed])).await;

    // The soft delete must carry the doctor_id predicate so another doctor's
    // rows can never be touched, whatever ids are passed in
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/shift_times"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(body_partial_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shift_row(removed, doctor_id, clinic_id, "2024-06-01", "9.00am - 10.00am")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(body_partial_json(json!({ "shift_time_ids": [kept] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_row(doctor_id, clinic_id, &[kept])
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = DoctorShiftManager::new(&test_config(&mock_server));
    let count = manager
        .remove_shifts(doctor_id, &[removed], Some("token"))
        .await
        .expect("remove shifts");

    assert_eq!(count, 1);
}

#[tokio::test]
async fn missing_doctor_fails_every_operation() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let manager = DoctorShiftManager::new(&test_config(&mock_server));
    let batch = vec![shift_input("2024-06-01", "9.00am - 10.00am")];

    assert_matches!(
        manager.upsert_shifts(doctor_id, &batch, Some("token")).await,
        Err(ShiftError::DoctorNotFound)
    );
    assert_matches!(
        manager.add_shifts(doctor_id, &batch, Some("token")).await,
        Err(ShiftError::DoctorNotFound)
    );
    assert_matches!(
        manager
            .remove_shifts(doctor_id, &[Uuid::new_v4()], Some("token"))
            .await,
        Err(ShiftError::DoctorNotFound)
    );
}
