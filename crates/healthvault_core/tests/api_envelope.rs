use healthvault_core::db::open_db_in_memory;
use healthvault_core::{
    health_check, AddRecordRequest, FixedIdentity, IdentityContext, Principal, RecordApi,
    RecordService, SqliteRecordStore, SqliteSequenceIdGenerator,
};
use rusqlite::Connection;

type SqliteApi<'conn> = RecordApi<SqliteRecordStore<'conn>, SqliteSequenceIdGenerator<'conn>>;

fn api(conn: &Connection) -> SqliteApi<'_> {
    RecordApi::new(RecordService::new(
        SqliteRecordStore::try_new(conn).unwrap(),
        SqliteSequenceIdGenerator::try_new(conn).unwrap(),
    ))
}

fn caller(text: &str) -> FixedIdentity {
    FixedIdentity::new(Principal::from_text(text))
}

fn blood_test() -> AddRecordRequest {
    AddRecordRequest {
        title: "Blood test".to_string(),
        record_type: "lab".to_string(),
        encrypted_url: "enc://abc".to_string(),
        file_size: Some(1024),
        date: None,
    }
}

#[test]
fn add_count_isolate_delete_scenario() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let a = caller("caller-a");
    let b = caller("caller-b");

    let added = api.add_record(&a, blood_test());
    assert!(added.success, "{}", added.message);
    assert_eq!(added.message, "Record added successfully");
    assert_eq!(added.records().len(), 1);
    let record = added.records()[0].clone();
    assert!(!record.id.is_empty());
    assert!(record.created_at > 0);
    assert_eq!(record.encrypted_url, "enc://abc");

    assert_eq!(api.get_record_count(&a), 1);

    let b_list = api.get_my_records(&b);
    assert!(b_list.success);
    assert_eq!(b_list.data, Some(Vec::new()));
    assert_eq!(b_list.message, "Found 0 records");

    let deleted = api.delete_record(&a, &record.id);
    assert!(deleted.success);
    assert_eq!(deleted.message, "Record deleted successfully");
    assert!(deleted.data.is_none());

    assert_eq!(api.get_record_count(&a), 0);
}

#[test]
fn get_by_id_wraps_single_record_or_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let a = caller("caller-a");
    let b = caller("caller-b");
    let id = api.add_record(&a, blood_test()).records()[0].id.clone();

    let found = api.get_record_by_id(&a, &id);
    assert!(found.success);
    assert_eq!(found.message, "Record found");
    assert_eq!(found.records().len(), 1);
    assert_eq!(found.records()[0].id, id);

    for response in [
        api.get_record_by_id(&b, &id),
        api.get_record_by_id(&a, "hr-unknown"),
        api.delete_record(&b, &id),
    ] {
        assert!(!response.success);
        assert_eq!(response.message, "Record not found or access denied");
        assert!(response.data.is_none());
    }
}

#[test]
fn list_message_reports_record_count() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let a = caller("caller-a");
    api.add_record(&a, blood_test());
    api.add_record(&a, blood_test());

    let listed = api.get_my_records(&a);
    assert!(listed.success);
    assert_eq!(listed.message, "Found 2 records");
    assert_eq!(listed.records().len() as u64, api.get_record_count(&a));
}

#[test]
fn validation_failures_become_failure_envelopes() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let mut request = blood_test();
    request.title = "   ".to_string();

    let response = api.add_record(&caller("caller-a"), request);
    assert!(!response.success);
    assert_eq!(response.message, "Title cannot be empty");
    assert!(response.data.is_none());
}

#[test]
fn anonymous_caller_gets_authentication_messages() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let anonymous = FixedIdentity::anonymous();

    let added = api.add_record(&anonymous, blood_test());
    assert!(!added.success);
    assert_eq!(added.message, "Anonymous users cannot add records");

    let listed = api.get_my_records(&anonymous);
    assert!(!listed.success);
    assert_eq!(listed.message, "Authentication required");

    assert_eq!(api.get_record_count(&anonymous), 0);
    assert!(api.whoami(&anonymous).is_anonymous());
}

#[test]
fn whoami_and_health_check_touch_no_state() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let a = caller("caller-a");

    assert_eq!(api.whoami(&a), a.caller());
    assert_eq!(api.health_check(), health_check());
    assert_eq!(api.get_record_count(&a), 0);
}

#[test]
fn envelope_serializes_to_documented_shape() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let response = api.add_record(&caller("caller-a"), blood_test());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Record added successfully");
    let record = &json["data"][0];
    for field in [
        "id",
        "title",
        "record_type",
        "date",
        "encrypted_url",
        "file_size",
        "created_at",
    ] {
        assert!(record.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(record["file_size"], 1024);
}

#[test]
fn count_includes_rows_that_fail_to_list() {
    let conn = open_db_in_memory().unwrap();
    let api = api(&conn);
    let a = caller("caller-a");
    let id = api.add_record(&a, blood_test()).records()[0].id.clone();

    conn.execute(
        "UPDATE health_records SET record_type = '  ' WHERE id = ?1;",
        [id.as_str()],
    )
    .unwrap();

    let listed = api.get_my_records(&a);
    assert!(!listed.success);
    assert!(listed.data.is_none());
    assert_eq!(api.get_record_count(&a), 1);
}
