//! Attendance state machine and status derivation.
//!
//! Per student id: not signed in -> signed in -> signed out. Nothing here
//! touches storage; callers hand in the current records and persist whatever
//! comes back.

use crate::error::{SignInError, SignOutError};
use crate::model::{AttendanceRecord, RosterEntry, SignatureImage, Timestamp};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    NotSignedIn,
    SignedIn,
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDisplay {
    pub label: &'static str,
    pub icon: &'static str,
    pub action_label: &'static str,
    pub badge_variant: &'static str,
    pub action_enabled: bool,
}

const STATUS_TABLE: [StatusDisplay; 3] = [
    StatusDisplay {
        label: "Not Signed In",
        icon: "alert-circle",
        action_label: "Sign In",
        badge_variant: "outline",
        action_enabled: true,
    },
    StatusDisplay {
        label: "Signed In",
        icon: "check-circle",
        action_label: "Sign Out",
        badge_variant: "default",
        action_enabled: true,
    },
    StatusDisplay {
        label: "Signed Out",
        icon: "x-circle",
        action_label: "Already Signed Out",
        badge_variant: "secondary",
        action_enabled: false,
    },
];

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::NotSignedIn,
        AttendanceStatus::SignedIn,
        AttendanceStatus::SignedOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::NotSignedIn => "not-signed-in",
            AttendanceStatus::SignedIn => "signed-in",
            AttendanceStatus::SignedOut => "signed-out",
        }
    }

    pub fn display(self) -> &'static StatusDisplay {
        let idx = match self {
            AttendanceStatus::NotSignedIn => 0,
            AttendanceStatus::SignedIn => 1,
            AttendanceStatus::SignedOut => 2,
        };
        &STATUS_TABLE[idx]
    }

    pub fn label(self) -> &'static str {
        self.display().label
    }

    pub fn icon(self) -> &'static str {
        self.display().icon
    }

    pub fn primary_action_label(self) -> &'static str {
        self.display().action_label
    }

    pub fn badge_variant(self) -> &'static str {
        self.display().badge_variant
    }

    pub fn action_enabled(self) -> bool {
        self.display().action_enabled
    }
}

fn status_of(record: Option<&AttendanceRecord>) -> AttendanceStatus {
    match record {
        None => AttendanceStatus::NotSignedIn,
        Some(r) if r.is_signed_out() => AttendanceStatus::SignedOut,
        Some(_) => AttendanceStatus::SignedIn,
    }
}

/// Ordered attendance records with an id -> first-record index.
///
/// Records loaded from storage may already repeat an id; the first one in
/// stored order is the one every lookup sees, and `sign_in` never adds
/// another.
#[derive(Debug, Clone, Default)]
pub struct AttendanceLedger {
    records: Vec<AttendanceRecord>,
    index: HashMap<String, usize>,
}

impl AttendanceLedger {
    pub fn from_records(records: Vec<AttendanceRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            index.entry(r.id.clone()).or_insert(i);
        }
        Self { records, index }
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AttendanceRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, id: &str) -> Option<&AttendanceRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn status(&self, id: &str) -> AttendanceStatus {
        status_of(self.record(id))
    }

    /// Ids that appear on more than one record, in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut out = Vec::new();
        for r in &self.records {
            let n = seen.entry(r.id.as_str()).or_insert(0);
            *n += 1;
            if *n == 2 {
                out.push(r.id.clone());
            }
        }
        out
    }

    pub fn sign_in(
        &mut self,
        id: &str,
        name: &str,
        signature: SignatureImage,
        time_in: Timestamp,
    ) -> Result<&AttendanceRecord, SignInError> {
        let id = id.trim();
        let name = name.trim();
        if self.index.contains_key(id) {
            return Err(SignInError::DuplicateSignIn);
        }
        if id.is_empty() || name.is_empty() {
            return Err(SignInError::MissingFields);
        }
        let pos = self.records.len();
        self.records.push(AttendanceRecord {
            id: id.to_string(),
            name: name.to_string(),
            time_in,
            signature_in: signature,
            time_out: None,
            signature_out: None,
        });
        self.index.insert(id.to_string(), pos);
        Ok(&self.records[pos])
    }

    pub fn sign_out(
        &mut self,
        id: &str,
        signature: SignatureImage,
        time_out: Timestamp,
    ) -> Result<&AttendanceRecord, SignOutError> {
        let Some(&pos) = self.index.get(id) else {
            return Err(SignOutError::NotSignedIn);
        };
        let record = &mut self.records[pos];
        if record.is_signed_out() {
            return Err(SignOutError::NotSignedIn);
        }
        record.time_out = Some(time_out);
        record.signature_out = Some(signature);
        Ok(record)
    }
}

pub fn status(id: &str, records: &[AttendanceRecord]) -> AttendanceStatus {
    status_of(records.iter().find(|r| r.id == id))
}

pub fn sign_in(
    records: &[AttendanceRecord],
    id: &str,
    name: &str,
    signature: SignatureImage,
    time_in: Timestamp,
) -> Result<Vec<AttendanceRecord>, SignInError> {
    let mut ledger = AttendanceLedger::from_records(records.to_vec());
    ledger.sign_in(id, name, signature, time_in)?;
    Ok(ledger.into_records())
}

pub fn sign_out(
    records: &[AttendanceRecord],
    record: &AttendanceRecord,
    signature: SignatureImage,
    time_out: Timestamp,
) -> Result<Vec<AttendanceRecord>, SignOutError> {
    let mut ledger = AttendanceLedger::from_records(records.to_vec());
    ledger.sign_out(&record.id, signature, time_out)?;
    Ok(ledger.into_records())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatusRow {
    pub id: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub display: StatusDisplay,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_out: Option<Timestamp>,
}

impl StudentStatusRow {
    fn new(id: &str, name: &str, record: Option<&AttendanceRecord>) -> Self {
        let status = status_of(record);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status,
            display: *status.display(),
            time_in: record.map(|r| r.time_in.clone()),
            time_out: record.and_then(|r| r.time_out.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub not_signed_in: usize,
    pub signed_in: usize,
    pub signed_out: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::NotSignedIn => self.not_signed_in += 1,
            AttendanceStatus::SignedIn => self.signed_in += 1,
            AttendanceStatus::SignedOut => self.signed_out += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub students: Vec<StudentStatusRow>,
    /// Sign-ins whose id is not on the roster.
    pub walk_ins: Vec<StudentStatusRow>,
    pub counts: StatusCounts,
}

pub fn dashboard(roster: &[RosterEntry], records: &[AttendanceRecord]) -> Dashboard {
    let ledger = AttendanceLedger::from_records(records.to_vec());
    let mut out = Dashboard::default();

    for entry in roster {
        let row = StudentStatusRow::new(&entry.id, &entry.name, ledger.record(&entry.id));
        out.counts.bump(row.status);
        out.students.push(row);
    }

    let on_roster: std::collections::HashSet<&str> =
        roster.iter().map(|e| e.id.as_str()).collect();
    for (i, r) in ledger.records().iter().enumerate() {
        let first = ledger.index.get(&r.id) == Some(&i);
        if first && !on_roster.contains(r.id.as_str()) {
            let row = StudentStatusRow::new(&r.id, &r.name, Some(r));
            out.counts.bump(row.status);
            out.walk_ins.push(row);
        }
    }
    out
}
