use parcel_core::db::schema::SCHEMA_VERSION;
use parcel_core::db::{open_db, open_db_in_memory, DbError, SchemaError};
use parcel_core::{
    GuardedWrite, Parcel, ParcelStatus, ParcelStore, ParcelValidationError, RepoError,
    SqliteParcelStore,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::collections::HashMap;

fn test_parcel() -> Parcel {
    Parcel {
        number: 0,
        client: 1000,
        status: ParcelStatus::Registered,
        address: "test".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn random_client(rng: &mut impl Rng) -> i64 {
    rng.gen_range(0..10_000_000)
}

#[test]
fn add_get_delete() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let mut parcel = test_parcel();

    let number = store.add(&parcel).unwrap();
    assert!(number > 0);

    let stored = store.get(number).unwrap();
    parcel.number = stored.number;
    assert_eq!(stored, parcel);

    store.delete(number).unwrap();
    let err = store.get(number).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(n) if n == number));
}

#[test]
fn add_ignores_caller_number_and_never_reuses_numbers() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();

    let mut parcel = test_parcel();
    parcel.number = 42;
    let first = store.add(&parcel).unwrap();
    assert_ne!(first, 42);

    store.delete(first).unwrap();
    let second = store.add(&parcel).unwrap();
    assert!(second > first);
}

#[test]
fn add_accepts_duplicate_content() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();

    let first = store.add(&test_parcel()).unwrap();
    let second = store.add(&test_parcel()).unwrap();
    assert_ne!(first, second);
}

#[test]
fn add_rejects_malformed_created_at() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();

    let mut parcel = test_parcel();
    parcel.created_at = "01.01.2024".to_string();
    let err = store.add(&parcel).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn add_rejects_created_at_with_non_utc_offset() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();

    let mut parcel = test_parcel();
    parcel.created_at = "2024-01-01T03:00:00+03:00".to_string();
    let err = store.add(&parcel).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ParcelValidationError::NonUtcCreatedAt(_))
    ));
    assert!(store.get_by_client(parcel.client).unwrap().is_empty());
}

#[test]
fn set_address_changes_only_address() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let parcel = test_parcel();
    let number = store.add(&parcel).unwrap();

    store.set_address(number, "new test address").unwrap();

    let stored = store.get(number).unwrap();
    assert_eq!(stored.address, "new test address");
    assert_eq!(stored.status, parcel.status);
    assert_eq!(stored.client, parcel.client);
    assert_eq!(stored.created_at, parcel.created_at);
}

#[test]
fn set_status_changes_only_status() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let parcel = test_parcel();
    let number = store.add(&parcel).unwrap();

    store.set_status(number, ParcelStatus::Sent).unwrap();

    let stored = store.get(number).unwrap();
    assert_eq!(stored.status, ParcelStatus::Sent);
    assert_eq!(stored.address, parcel.address);
    assert_eq!(stored.client, parcel.client);
    assert_eq!(stored.created_at, parcel.created_at);
}

#[test]
fn store_imposes_no_lifecycle_rules() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let number = store.add(&test_parcel()).unwrap();

    store.set_status(number, ParcelStatus::Delivered).unwrap();
    store.set_address(number, "late change").unwrap();
    store.set_status(number, ParcelStatus::Registered).unwrap();
    store.delete(number).unwrap();
}

#[test]
fn writes_on_missing_number_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let existing = store.add(&test_parcel()).unwrap();
    let missing = existing + 100;

    assert!(matches!(
        store.set_address(missing, "nowhere"),
        Err(RepoError::NotFound(n)) if n == missing
    ));
    assert!(matches!(
        store.set_status(missing, ParcelStatus::Sent),
        Err(RepoError::NotFound(n)) if n == missing
    ));
    assert!(matches!(
        store.delete(missing),
        Err(RepoError::NotFound(n)) if n == missing
    ));

    let untouched = store.get(existing).unwrap();
    assert_eq!(untouched.address, "test");
    assert_eq!(untouched.status, ParcelStatus::Registered);
}

#[test]
fn get_by_client_returns_exactly_matching_parcels() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let mut rng = StdRng::from_entropy();
    let client = random_client(&mut rng);

    let mut expected = HashMap::new();
    for index in 0..3 {
        let mut parcel = test_parcel();
        parcel.client = client;
        parcel.address = format!("address {index}");
        parcel.number = store.add(&parcel).unwrap();
        expected.insert(parcel.number, parcel);

        let mut other = test_parcel();
        other.client = client + 1;
        store.add(&other).unwrap();
    }

    let stored = store.get_by_client(client).unwrap();
    assert_eq!(stored.len(), expected.len());
    for parcel in stored {
        assert_eq!(expected.get(&parcel.number), Some(&parcel));
    }
}

#[test]
fn get_by_client_without_parcels_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    store.add(&test_parcel()).unwrap();

    assert!(store.get_by_client(-1).unwrap().is_empty());
}

#[test]
fn parcels_persist_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");

    let number = {
        let conn = open_db(&path).unwrap();
        let store = SqliteParcelStore::try_new(&conn).unwrap();
        store.add(&test_parcel()).unwrap()
    };

    let conn = open_db(&path).unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    assert_eq!(store.get(number).unwrap().address, "test");
}

#[test]
fn get_rejects_unknown_persisted_status() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO parcel (client, status, address, created_at)
         VALUES (1, 'lost', 'x', '2024-01-01T00:00:00Z');",
    )
    .unwrap();
    let number = conn.last_insert_rowid();

    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let err = store.get(number).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("lost")));
}

#[test]
fn schema_check_rejects_unknown_status_on_raw_insert() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO parcel (client, status, address, created_at)
         VALUES (1, 'lost', 'x', '2024-01-01T00:00:00Z');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn guarded_writes_apply_only_in_expected_status() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let number = store.add(&test_parcel()).unwrap();

    assert_eq!(
        store
            .set_status_when(number, ParcelStatus::Registered, ParcelStatus::Sent)
            .unwrap(),
        GuardedWrite::Applied
    );
    assert_eq!(
        store
            .set_address_when(number, "too late", ParcelStatus::Registered)
            .unwrap(),
        GuardedWrite::StatusMismatch(ParcelStatus::Sent)
    );
    assert_eq!(
        store.delete_when(number, ParcelStatus::Registered).unwrap(),
        GuardedWrite::StatusMismatch(ParcelStatus::Sent)
    );

    let stored = store.get(number).unwrap();
    assert_eq!(stored.status, ParcelStatus::Sent);
    assert_eq!(stored.address, "test");
}

#[test]
fn guarded_writes_on_missing_number_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();

    assert!(matches!(
        store.set_address_when(77, "x", ParcelStatus::Registered),
        Err(RepoError::NotFound(77))
    ));
    assert!(matches!(
        store.set_status_when(77, ParcelStatus::Registered, ParcelStatus::Sent),
        Err(RepoError::NotFound(77))
    ));
    assert!(matches!(
        store.delete_when(77, ParcelStatus::Registered),
        Err(RepoError::NotFound(77))
    ));
}

fn schema_error(result: Result<SqliteParcelStore<'_>, RepoError>) -> SchemaError {
    match result {
        Err(RepoError::Db(DbError::Schema(err))) => err,
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected schema error"),
    }
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    assert_eq!(
        schema_error(SqliteParcelStore::try_new(&conn)),
        SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            actual: 0
        }
    );
}

#[test]
fn store_rejects_connection_without_parcel_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
        .unwrap();

    assert_eq!(
        schema_error(SqliteParcelStore::try_new(&conn)),
        SchemaError::MissingTable("parcel")
    );
}

#[test]
fn store_rejects_parcel_table_missing_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL,
            status TEXT NOT NULL,
            address TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
        .unwrap();

    assert_eq!(
        schema_error(SqliteParcelStore::try_new(&conn)),
        SchemaError::MissingColumn {
            table: "parcel",
            column: "created_at"
        }
    );
}
