use healthvault_core::db::{open_db, open_db_in_memory};
use healthvault_core::repo::id_gen::RECORD_ID_PREFIX;
use healthvault_core::{
    HealthRecord, IdGenerator, Principal, RecordStore, RepoError, SqliteRecordStore,
    SqliteSequenceIdGenerator, UuidIdGenerator,
};
use std::collections::HashSet;

#[test]
fn sequence_ids_are_monotonic_and_unique() {
    let conn = open_db_in_memory().unwrap();
    let ids = SqliteSequenceIdGenerator::try_new(&conn).unwrap();

    let issued: Vec<String> = (0..50).map(|_| ids.next_id().unwrap()).collect();
    let unique: HashSet<&String> = issued.iter().collect();
    assert_eq!(unique.len(), issued.len());

    let mut sorted = issued.clone();
    sorted.sort();
    assert_eq!(sorted, issued);
    assert_eq!(issued[0], "hr-0000000000000001");
    assert_eq!(ids.current_value().unwrap(), 50);
}

#[test]
fn sequence_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("healthvault.db");

    let first_session: Vec<String> = {
        let conn = open_db(&path).unwrap();
        let ids = SqliteSequenceIdGenerator::try_new(&conn).unwrap();
        (0..3).map(|_| ids.next_id().unwrap()).collect()
    };

    let conn = open_db(&path).unwrap();
    let ids = SqliteSequenceIdGenerator::try_new(&conn).unwrap();
    let next = ids.next_id().unwrap();

    assert!(!first_session.contains(&next));
    assert!(first_session.iter().all(|earlier| earlier < &next));
}

#[test]
fn sequence_reports_exhaustion_instead_of_wrapping() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "UPDATE record_id_sequence SET value = ?1 WHERE singleton = 1;",
        [i64::MAX],
    )
    .unwrap();
    let ids = SqliteSequenceIdGenerator::try_new(&conn).unwrap();

    let err = ids.next_id().unwrap_err();
    assert!(matches!(err, RepoError::IdSpaceExhausted));
    assert_eq!(ids.current_value().unwrap(), i64::MAX);
}

#[test]
fn missing_sequence_row_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("DELETE FROM record_id_sequence;", []).unwrap();
    let ids = SqliteSequenceIdGenerator::try_new(&conn).unwrap();

    assert!(matches!(ids.next_id(), Err(RepoError::InvalidData(_))));
}

#[test]
fn uuid_ids_are_prefixed_unique_and_insertable() {
    let conn = open_db_in_memory().unwrap();
    let ids = UuidIdGenerator::try_new(&conn).unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let owner = Principal::from_text("owner-uuid");

    let mut seen = HashSet::new();
    for n in 0..20u64 {
        let id = ids.next_id().unwrap();
        assert!(id.starts_with(RECORD_ID_PREFIX));
        assert!(seen.insert(id.clone()));

        let record = HealthRecord {
            id,
            title: format!("scan {n}"),
            record_type: "imaging".to_string(),
            date: n,
            encrypted_url: "enc://scan".to_string(),
            file_size: None,
            created_at: n,
        };
        store.insert(&owner, &record).unwrap();
    }

    assert_eq!(store.count(&owner).unwrap(), 20);
}
