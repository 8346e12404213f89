//! Session coordinator: the one owner of the store.
//!
//! Each store key has its own write lock. Any read-modify-write of a key runs
//! entirely under that key's lock; reset takes all of them in
//! `StoreKey::ALL` order.

use crate::clock::{Clock, SystemClock};
use crate::engine::{self, AttendanceLedger, AttendanceStatus, Dashboard};
use crate::error::{SessionError, StoreError};
use crate::export::{self, ExportArchive};
use crate::model::{
    AttendanceRecord, ClassDetails, ClassDetailsField, RosterEntry, SignatureImage,
};
use crate::roster::{self, RawTable};
use crate::store::{KvStore, StoreKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Default)]
struct KeyLocks {
    class_details: Mutex<()>,
    student_roster: Mutex<()>,
    attendance: Mutex<()>,
}

impl KeyLocks {
    fn lock(&self, key: StoreKey) -> MutexGuard<'_, ()> {
        let m = match key {
            StoreKey::ClassDetails => &self.class_details,
            StoreKey::StudentRoster => &self.student_roster,
            StoreKey::AttendanceRecords => &self.attendance,
        };
        // The guarded data lives in the store, so a panic elsewhere leaves
        // nothing half-written behind the mutex.
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct SessionCoordinator {
    store: Box<dyn KvStore>,
    clock: Box<dyn Clock>,
    locks: KeyLocks,
}

impl SessionCoordinator {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self::with_clock(store, Box::new(SystemClock))
    }

    pub fn with_clock(store: Box<dyn KvStore>, clock: Box<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: KeyLocks::default(),
        }
    }

    fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Option<T>, StoreError> {
        let Some(value) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key,
                message: e.to_string(),
            })
    }

    fn save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Corrupt {
            key,
            message: e.to_string(),
        })?;
        self.store.set(key, &value)
    }

    // ---- class details ----

    pub fn class_details(&self) -> Result<Option<ClassDetails>, SessionError> {
        Ok(self.load(StoreKey::ClassDetails)?)
    }

    /// Merges one field into the stored details. Edits to different fields
    /// serialize on the same key lock, so neither is dropped.
    pub fn update_class_detail(
        &self,
        field: ClassDetailsField,
        value: &str,
    ) -> Result<ClassDetails, SessionError> {
        let _guard = self.locks.lock(StoreKey::ClassDetails);
        let current: ClassDetails = self.load(StoreKey::ClassDetails)?.unwrap_or_default();
        let next = current.with_field(field, value);
        self.save(StoreKey::ClassDetails, &next)?;
        debug!(field = field.as_str(), "class detail updated");
        Ok(next)
    }

    pub fn replace_class_details(&self, details: &ClassDetails) -> Result<(), SessionError> {
        let _guard = self.locks.lock(StoreKey::ClassDetails);
        self.save(StoreKey::ClassDetails, details)?;
        Ok(())
    }

    // ---- roster ----

    pub fn roster(&self) -> Result<Vec<RosterEntry>, SessionError> {
        Ok(self.load(StoreKey::StudentRoster)?.unwrap_or_default())
    }

    /// Validates without writing.
    pub fn preview_roster(&self, table: &RawTable) -> Result<Vec<RosterEntry>, SessionError> {
        Ok(roster::import(table)?)
    }

    /// Validates, then replaces the stored roster in full. A failed import
    /// leaves the previous roster in place.
    pub fn import_roster(&self, table: &RawTable) -> Result<Vec<RosterEntry>, SessionError> {
        let entries = roster::import(table)?;
        let _guard = self.locks.lock(StoreKey::StudentRoster);
        self.save(StoreKey::StudentRoster, &entries)?;
        info!(students = entries.len(), "roster imported");
        Ok(entries)
    }

    // ---- attendance ----

    pub fn records(&self) -> Result<Vec<AttendanceRecord>, SessionError> {
        Ok(self.load(StoreKey::AttendanceRecords)?.unwrap_or_default())
    }

    fn ledger(&self) -> Result<AttendanceLedger, SessionError> {
        let ledger = AttendanceLedger::from_records(self.records()?);
        let dupes = ledger.duplicate_ids();
        if !dupes.is_empty() {
            warn!(ids = ?dupes, "attendance records repeat ids; first record wins");
        }
        Ok(ledger)
    }

    pub fn status(&self, id: &str) -> Result<AttendanceStatus, SessionError> {
        Ok(self.ledger()?.status(id))
    }

    pub fn dashboard(&self) -> Result<Dashboard, SessionError> {
        let roster = self.roster()?;
        let records = self.records()?;
        Ok(engine::dashboard(&roster, &records))
    }

    pub fn sign_in(
        &self,
        id: &str,
        name: &str,
        signature: SignatureImage,
    ) -> Result<AttendanceRecord, SessionError> {
        let _guard = self.locks.lock(StoreKey::AttendanceRecords);
        let mut ledger = self.ledger()?;
        let record = ledger
            .sign_in(id, name, signature, self.clock.now())?
            .clone();
        self.save(StoreKey::AttendanceRecords, ledger.records())?;
        info!(id = %record.id, "student signed in");
        Ok(record)
    }

    pub fn sign_out(
        &self,
        id: &str,
        signature: SignatureImage,
    ) -> Result<AttendanceRecord, SessionError> {
        let _guard = self.locks.lock(StoreKey::AttendanceRecords);
        let mut ledger = self.ledger()?;
        let record = ledger.sign_out(id, signature, self.clock.now())?.clone();
        self.save(StoreKey::AttendanceRecords, ledger.records())?;
        info!(id = %record.id, "student signed out");
        Ok(record)
    }

    // ---- export / reset ----

    /// Reads class details at call time so the file name tracks the latest edit.
    pub fn export(&self) -> Result<ExportArchive, SessionError> {
        let details = self.class_details()?;
        let records = self.records()?;
        let archive = export::build_export(details.as_ref(), &records)?;
        info!(
            file = %archive.file_name,
            entries = archive.entries.len(),
            "export built"
        );
        Ok(archive)
    }

    /// Clears every session key. Each removal is attempted even after an
    /// earlier one fails; the failures come back as `PartialFailure`.
    pub fn reset(&self) -> Result<(), SessionError> {
        let _guards: Vec<MutexGuard<'_, ()>> =
            StoreKey::ALL.iter().map(|k| self.locks.lock(*k)).collect();

        let mut failed = Vec::new();
        for key in StoreKey::ALL {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key.as_str(), error = %e, "failed to clear key");
                failed.push(key);
            }
        }
        if failed.is_empty() {
            info!("session reset");
            Ok(())
        } else {
            Err(StoreError::PartialFailure(failed).into())
        }
    }
}
