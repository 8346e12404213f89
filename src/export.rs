use crate::error::ExportError;
use crate::model::{AttendanceRecord, ClassDetails};
use crate::normalize::{csv_quote, decode_data_url, path_component};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::io::{Cursor, Write};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const EXPORT_FORMAT: &str = "labcheck-export-v1";
pub const MANIFEST_ENTRY: &str = "manifest.json";
pub const SHEET_ENTRY: &str = "sign_in_sheet.csv";
pub const CLASS_DETAILS_ENTRY: &str = "class_details.txt";
pub const SIGNATURES_DIR: &str = "signatures";
pub const FALLBACK_FILE_NAME: &str = "lab_check_export.zip";

const SHEET_HEADER: &str = "Student Name,Student ID,Time In,Time Out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    SignIn,
    SignOut,
}

impl SignatureKind {
    fn suffix(self) -> &'static str {
        match self {
            SignatureKind::SignIn => "signin",
            SignatureKind::SignOut => "signout",
        }
    }
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignatureKind::SignIn => "sign-in",
            SignatureKind::SignOut => "sign-out",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Entry names in write order, manifest last.
    pub entries: Vec<String>,
    pub export_id: String,
}

pub fn export_file_name(class_details: Option<&ClassDetails>) -> String {
    match class_details {
        Some(d) => format!(
            "{}_Week{}_Day{}.zip",
            d.class_name, d.class_week, d.class_day
        ),
        None => FALLBACK_FILE_NAME.to_string(),
    }
}

pub fn sign_in_sheet(class_details: Option<&ClassDetails>, records: &[AttendanceRecord]) -> String {
    let mut csv = String::new();
    if let Some(d) = class_details {
        csv.push_str(&format!(
            "Class: {}, Week: {}, Day: {}\n",
            d.class_name, d.class_week, d.class_day
        ));
    }
    csv.push_str(SHEET_HEADER);
    csv.push('\n');
    for r in records {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            csv_quote(&r.name),
            csv_quote(&r.id),
            csv_quote(&r.time_in),
            csv_quote(r.time_out.as_deref().unwrap_or(""))
        ));
    }
    csv
}

struct PendingEntry {
    name: String,
    bytes: Vec<u8>,
    method: CompressionMethod,
}

fn signature_entries(records: &[AttendanceRecord]) -> Result<Vec<PendingEntry>, ExportError> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for r in records {
        let sides = [
            (SignatureKind::SignIn, Some(&r.signature_in)),
            (SignatureKind::SignOut, r.signature_out.as_ref()),
        ];
        for (kind, sig) in sides {
            let Some(sig) = sig.filter(|s| !s.is_empty()) else {
                continue;
            };
            let img = decode_data_url(sig.as_str()).ok_or_else(|| ExportError::InvalidSignature {
                id: r.id.clone(),
                kind,
            })?;
            let name = format!(
                "{}/{}_{}.{}",
                SIGNATURES_DIR,
                path_component(&r.id),
                kind.suffix(),
                img.extension
            );
            // Repeated ids would collide on the entry name; the first record keeps it.
            if !seen.insert(name.clone()) {
                continue;
            }
            out.push(PendingEntry {
                name,
                bytes: img.bytes,
                // PNG/JPEG payloads are already compressed.
                method: CompressionMethod::Stored,
            });
        }
    }
    Ok(out)
}

/// Packs the session into a zip. Everything is decoded and serialized before
/// the first byte is written, so a bad signature fails the whole export.
pub fn build_export(
    class_details: Option<&ClassDetails>,
    records: &[AttendanceRecord],
) -> Result<ExportArchive, ExportError> {
    let mut pending: Vec<PendingEntry> = Vec::new();

    if !records.is_empty() {
        pending.push(PendingEntry {
            name: SHEET_ENTRY.to_string(),
            bytes: sign_in_sheet(class_details, records).into_bytes(),
            method: CompressionMethod::Deflated,
        });
        pending.extend(signature_entries(records)?);
    }

    if let Some(d) = class_details {
        let text = serde_json::to_string_pretty(d)
            .map_err(|e| ExportError::Archive(format!("failed to serialize class details: {e}")))?;
        pending.push(PendingEntry {
            name: CLASS_DETAILS_ENTRY.to_string(),
            bytes: text.into_bytes(),
            method: CompressionMethod::Deflated,
        });
    }

    let export_id = Uuid::new_v4().to_string();
    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": EXPORT_FORMAT,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportId": export_id,
        "exportedAt": exported_at,
        "recordCount": records.len(),
        "entries": pending
            .iter()
            .map(|e| json!({
                "name": e.name,
                "size": e.bytes.len(),
                "sha256": format!("{:x}", Sha256::digest(&e.bytes)),
            }))
            .collect::<Vec<_>>(),
    });
    let manifest_text = serde_json::to_string_pretty(&manifest)
        .map_err(|e| ExportError::Archive(format!("failed to serialize manifest: {e}")))?;
    pending.push(PendingEntry {
        name: MANIFEST_ENTRY.to_string(),
        bytes: manifest_text.into_bytes(),
        method: CompressionMethod::Deflated,
    });

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(pending.len());
    for entry in pending {
        let opts = FileOptions::default().compression_method(entry.method);
        zip.start_file(entry.name.as_str(), opts)?;
        zip.write_all(&entry.bytes)?;
        entries.push(entry.name);
    }
    let bytes = zip.finish()?.into_inner();

    Ok(ExportArchive {
        file_name: export_file_name(class_details),
        bytes,
        entries,
        export_id,
    })
}
