use healthvault_core::db::open_db;
use healthvault_core::{
    AddRecordRequest, FixedIdentity, Principal, RecordApi, RecordService, RecordStore,
    SqliteRecordStore, SqliteSequenceIdGenerator,
};
use rusqlite::TransactionBehavior;
use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const WRITERS: usize = 4;
const RECORDS_PER_WRITER: usize = 25;

fn add_many(path: PathBuf, owner: Principal) -> Vec<String> {
    let conn = open_db(&path).unwrap();
    let service = RecordService::new(
        SqliteRecordStore::try_new(&conn).unwrap(),
        SqliteSequenceIdGenerator::try_new(&conn).unwrap(),
    );

    (0..RECORDS_PER_WRITER)
        .map(|n| {
            let request = AddRecordRequest {
                title: format!("{owner} record {n}"),
                record_type: "lab".to_string(),
                encrypted_url: format!("enc://{owner}/{n}"),
                file_size: None,
                date: None,
            };
            service.add_record(&owner, request).unwrap().id
        })
        .collect()
}

#[test]
fn parallel_writers_on_separate_connections_never_share_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    drop(open_db(&path).unwrap());

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let path = path.clone();
            let owner = Principal::from_text(format!("writer-{writer}"));
            thread::spawn(move || (owner.clone(), add_many(path, owner)))
        })
        .collect();

    let mut all_ids = HashSet::new();
    let mut per_owner = Vec::new();
    for handle in handles {
        let (owner, ids) = handle.join().unwrap();
        for id in &ids {
            assert!(all_ids.insert(id.clone()), "id issued twice: {id}");
        }
        per_owner.push((owner, ids));
    }
    assert_eq!(all_ids.len(), WRITERS * RECORDS_PER_WRITER);

    let conn = open_db(&path).unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    for (owner, ids) in per_owner {
        let listed: Vec<String> = store
            .list(&owner)
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(listed, ids, "insertion order for {owner}");
    }
}

#[test]
fn readers_see_last_committed_state_while_a_writer_holds_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.db");
    let owner = Principal::from_text("reader-owner");
    let written = add_many(path.clone(), owner.clone());

    let reader = open_db(&path).unwrap();
    let api = RecordApi::new(RecordService::new(
        SqliteRecordStore::try_new(&reader).unwrap(),
        SqliteSequenceIdGenerator::try_new(&reader).unwrap(),
    ));
    let caller = FixedIdentity::new(owner.clone());

    let mut writer = open_db(&path).unwrap();
    let pending = writer
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    pending
        .execute("DELETE FROM health_records WHERE owner = ?1;", [owner.as_str()])
        .unwrap();

    let started = Instant::now();
    let listed = api.get_my_records(&caller);
    let count = api.get_record_count(&caller);
    assert!(started.elapsed() < Duration::from_secs(1), "reader waited on writer");

    assert!(listed.success, "{}", listed.message);
    assert_eq!(listed.records().len(), written.len());
    assert_eq!(count, written.len() as u64);

    pending.commit().unwrap();
    assert_eq!(api.get_record_count(&caller), 0);
    assert!(api.get_my_records(&caller).records().is_empty());
}
