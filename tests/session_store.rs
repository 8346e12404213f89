use labcheckd::clock::FixedClock;
use labcheckd::engine::AttendanceStatus;
use labcheckd::error::{ImportError, SessionError, SignInError, SignOutError, StoreError};
use labcheckd::model::{ClassDetails, ClassDetailsField, RosterEntry, SignatureImage};
use labcheckd::roster::RawTable;
use labcheckd::session::SessionCoordinator;
use labcheckd::store::{KvStore, MemoryStore, SqliteStore, StoreKey};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn memory_session() -> SessionCoordinator {
    SessionCoordinator::with_clock(
        Box::new(MemoryStore::new()),
        Box::new(FixedClock("10/19/2026, 9:05:00 AM".to_string())),
    )
}

fn sig() -> SignatureImage {
    SignatureImage::new("data:image/png;base64,UE5HREFUQQ==")
}

fn roster_table(rows: &[(&str, &str)]) -> RawTable {
    RawTable::new(
        vec!["Student Name".to_string(), "Student ID".to_string()],
        rows.iter()
            .map(|(n, i)| vec![n.to_string(), i.to_string()])
            .collect(),
    )
}

/// Removal of one key always fails; everything else is delegated.
struct StickyStore {
    inner: MemoryStore,
    sticky: StoreKey,
}

impl KvStore for StickyStore {
    fn get(&self, key: StoreKey) -> Result<Option<serde_json::Value>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: StoreKey, value: &serde_json::Value) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        if key == self.sticky {
            return Err(StoreError::unavailable("disk is read-only"));
        }
        self.inner.remove(key)
    }
}

#[test]
fn sign_in_uses_clock_and_persists() {
    let s = memory_session();
    let record = s.sign_in("1", "Ann", sig()).expect("sign in");
    assert_eq!(record.time_in, "10/19/2026, 9:05:00 AM");
    assert_eq!(s.status("1").expect("status"), AttendanceStatus::SignedIn);
    assert_eq!(s.records().expect("records"), vec![record]);

    assert_eq!(
        s.sign_in("1", "Ann", sig()),
        Err(SessionError::SignIn(SignInError::DuplicateSignIn))
    );
    s.sign_out("1", sig()).expect("sign out");
    assert_eq!(s.status("1").expect("status"), AttendanceStatus::SignedOut);
    assert_eq!(
        s.sign_out("1", sig()),
        Err(SessionError::SignOut(SignOutError::NotSignedIn))
    );
}

#[test]
fn reset_returns_everyone_to_not_signed_in() {
    let s = memory_session();
    s.import_roster(&roster_table(&[("Ann", "1")])).expect("import");
    s.update_class_detail(ClassDetailsField::ClassName, "Bio")
        .expect("class name");
    s.sign_in("1", "Ann", sig()).expect("sign in");

    s.reset().expect("reset");
    assert_eq!(s.status("1").expect("status"), AttendanceStatus::NotSignedIn);
    assert!(s.roster().expect("roster").is_empty());
    assert!(s.records().expect("records").is_empty());
    assert_eq!(s.class_details().expect("details"), None);

    // Signing in again after a reset starts a fresh record.
    s.sign_in("1", "Ann", sig()).expect("sign in after reset");
}

#[test]
fn reset_reports_keys_that_could_not_be_cleared() {
    let s = SessionCoordinator::new(Box::new(StickyStore {
        inner: MemoryStore::new(),
        sticky: StoreKey::StudentRoster,
    }));
    s.import_roster(&roster_table(&[("Ann", "1")])).expect("import");
    s.sign_in("1", "Ann", sig()).expect("sign in");

    assert_eq!(
        s.reset(),
        Err(SessionError::Store(StoreError::PartialFailure(vec![
            StoreKey::StudentRoster
        ])))
    );
    // The other keys were still cleared.
    assert!(s.records().expect("records").is_empty());
    assert_eq!(s.roster().expect("roster").len(), 1);
}

#[test]
fn failed_import_keeps_previous_roster() {
    let s = memory_session();
    s.import_roster(&roster_table(&[("Ann", "1"), ("Bo", "2")]))
        .expect("first import");

    let bad = RawTable::new(
        vec!["Name".to_string(), "Grade".to_string()],
        vec![vec!["Cy".to_string(), "A".to_string()]],
    );
    assert_eq!(
        s.import_roster(&bad),
        Err(SessionError::Import(ImportError::MissingColumns))
    );
    assert_eq!(s.roster().expect("roster").len(), 2);

    let replaced = s
        .import_roster(&roster_table(&[("Cy", "3")]))
        .expect("second import");
    assert_eq!(
        replaced,
        vec![RosterEntry {
            id: "3".to_string(),
            name: "Cy".to_string()
        }]
    );
    assert_eq!(s.roster().expect("roster"), replaced);
}

#[test]
fn preview_does_not_write() {
    let s = memory_session();
    let entries = s
        .preview_roster(&roster_table(&[("Ann", "1")]))
        .expect("preview");
    assert_eq!(entries.len(), 1);
    assert!(s.roster().expect("roster").is_empty());
}

#[test]
fn concurrent_field_edits_are_all_kept() {
    let s = Arc::new(memory_session());
    let edits = [
        (ClassDetailsField::ClassName, "Chem"),
        (ClassDetailsField::ClassWeek, "4"),
        (ClassDetailsField::ClassDay, "1"),
    ];
    let handles: Vec<_> = edits
        .into_iter()
        .map(|(field, value)| {
            let s = Arc::clone(&s);
            thread::spawn(move || {
                s.update_class_detail(field, value).expect("update");
            })
        })
        .collect();
    for h in handles {
        h.join().expect("join");
    }
    assert_eq!(
        s.class_details().expect("details"),
        Some(ClassDetails {
            class_name: "Chem".to_string(),
            class_week: "4".to_string(),
            class_day: "1".to_string(),
        })
    );
}

#[test]
fn concurrent_sign_ins_for_distinct_ids_all_land() {
    let s = Arc::new(memory_session());
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let s = Arc::clone(&s);
            thread::spawn(move || {
                s.sign_in(&format!("id-{i}"), &format!("Student {i}"), sig())
                    .expect("sign in");
            })
        })
        .collect();
    for h in handles {
        h.join().expect("join");
    }
    let records = s.records().expect("records");
    assert_eq!(records.len(), 16);
    for i in 0..16 {
        assert_eq!(
            s.status(&format!("id-{i}")).expect("status"),
            AttendanceStatus::SignedIn
        );
    }
}

#[test]
fn export_name_tracks_latest_class_details() {
    let s = memory_session();
    assert_eq!(s.export().expect("export").file_name, "lab_check_export.zip");

    s.update_class_detail(ClassDetailsField::ClassName, "Bio")
        .expect("name");
    s.update_class_detail(ClassDetailsField::ClassWeek, "1")
        .expect("week");
    s.update_class_detail(ClassDetailsField::ClassDay, "2")
        .expect("day");
    assert_eq!(s.export().expect("export").file_name, "Bio_Week1_Day2.zip");

    s.update_class_detail(ClassDetailsField::ClassWeek, "5")
        .expect("week again");
    assert_eq!(s.export().expect("export").file_name, "Bio_Week5_Day2.zip");
}

#[test]
fn sqlite_store_survives_reopen() {
    let workspace = temp_dir("labcheck-session-reopen");
    {
        let s = SessionCoordinator::new(Box::new(
            SqliteStore::open(&workspace).expect("open store"),
        ));
        s.import_roster(&roster_table(&[("Ann", "1"), ("Bo", "2")]))
            .expect("import");
        s.replace_class_details(&ClassDetails {
            class_name: "Bio".to_string(),
            class_week: "2".to_string(),
            class_day: "3".to_string(),
        })
        .expect("details");
        s.sign_in("2", "Bo", sig()).expect("sign in");
    }

    let s = SessionCoordinator::new(Box::new(
        SqliteStore::open(&workspace).expect("reopen store"),
    ));
    assert_eq!(s.roster().expect("roster").len(), 2);
    assert_eq!(s.status("2").expect("status"), AttendanceStatus::SignedIn);
    assert_eq!(
        s.class_details()
            .expect("details")
            .map(|d| d.class_name),
        Some("Bio".to_string())
    );

    s.reset().expect("reset");
    let s = SessionCoordinator::new(Box::new(
        SqliteStore::open(&workspace).expect("reopen after reset"),
    ));
    assert!(s.records().expect("records").is_empty());
    assert!(s.roster().expect("roster").is_empty());

    let _ = std::fs::remove_dir_all(&workspace);
}

#[test]
fn corrupt_stored_value_is_reported_with_its_key() {
    let store = SqliteStore::open_in_memory().expect("open");
    store
        .set(StoreKey::AttendanceRecords, &serde_json::json!({ "not": "a list" }))
        .expect("seed");
    let s = SessionCoordinator::new(Box::new(store));
    match s.records() {
        Err(SessionError::Store(StoreError::Corrupt { key, .. })) => {
            assert_eq!(key, StoreKey::AttendanceRecords)
        }
        other => panic!("expected corrupt store error, got {other:?}"),
    }
}

#[test]
fn stored_keys_use_shell_names() {
    assert_eq!(StoreKey::ClassDetails.as_str(), "classDetails");
    assert_eq!(StoreKey::StudentRoster.as_str(), "studentRoster");
    assert_eq!(StoreKey::AttendanceRecords.as_str(), "students");
}
