use labcheckd::error::ExportError;
use labcheckd::export::{
    build_export, export_file_name, sign_in_sheet, SignatureKind, CLASS_DETAILS_ENTRY,
    FALLBACK_FILE_NAME, MANIFEST_ENTRY, SHEET_ENTRY,
};
use labcheckd::model::{AttendanceRecord, ClassDetails, SignatureImage};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};

// "PNGDATA"
const PNG_URL: &str = "data:image/png;base64,UE5HREFUQQ==";
// "OUT"
const PNG_OUT_URL: &str = "data:image/png;base64,T1VU";

fn details() -> ClassDetails {
    ClassDetails {
        class_name: "Bio101".to_string(),
        class_week: "3".to_string(),
        class_day: "2".to_string(),
    }
}

fn record(id: &str, name: &str, time_in: &str, out: Option<(&str, &str)>) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        name: name.to_string(),
        time_in: time_in.to_string(),
        signature_in: SignatureImage::new(PNG_URL),
        time_out: out.map(|(t, _)| t.to_string()),
        signature_out: out.map(|(_, s)| SignatureImage::new(s)),
    }
}

fn open(bytes: &[u8]) -> zip::ZipArchive<Cursor<Vec<u8>>> {
    zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("open zip")
}

fn read_entry(zip: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
    let mut f = zip.by_name(name).expect("entry present");
    let mut out = Vec::new();
    f.read_to_end(&mut out).expect("read entry");
    out
}

fn names(zip: &mut zip::ZipArchive<Cursor<Vec<u8>>>) -> Vec<String> {
    (0..zip.len())
        .map(|i| zip.by_index(i).expect("entry").name().to_string())
        .collect()
}

#[test]
fn signed_in_only_record_exports_one_signature() {
    let records = vec![record("1", "Ann", "T1", None)];
    let archive = build_export(Some(&details()), &records).expect("export");
    assert_eq!(archive.file_name, "Bio101_Week3_Day2.zip");

    let mut zip = open(&archive.bytes);
    let sheet = String::from_utf8(read_entry(&mut zip, SHEET_ENTRY)).expect("utf8");
    let lines: Vec<&str> = sheet.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Class: Bio101, Week: 3, Day: 2",
            "Student Name,Student ID,Time In,Time Out",
            "Ann,1,T1,",
        ]
    );

    let sigs: Vec<String> = names(&mut zip)
        .into_iter()
        .filter(|n| n.starts_with("signatures/"))
        .collect();
    assert_eq!(sigs, vec!["signatures/1_signin.png".to_string()]);
    assert_eq!(read_entry(&mut zip, "signatures/1_signin.png"), b"PNGDATA");
}

#[test]
fn signed_out_record_carries_both_signatures() {
    let records = vec![record("7", "Bo", "T1", Some(("T2", PNG_OUT_URL)))];
    let archive = build_export(Some(&details()), &records).expect("export");
    let mut zip = open(&archive.bytes);
    assert_eq!(read_entry(&mut zip, "signatures/7_signin.png"), b"PNGDATA");
    assert_eq!(read_entry(&mut zip, "signatures/7_signout.png"), b"OUT");
    let sheet = String::from_utf8(read_entry(&mut zip, SHEET_ENTRY)).expect("utf8");
    assert!(sheet.ends_with("Bo,7,T1,T2\n"), "{sheet}");
}

#[test]
fn class_details_entry_is_the_stored_json() {
    let archive = build_export(Some(&details()), &[]).expect("export");
    let mut zip = open(&archive.bytes);
    let text = read_entry(&mut zip, CLASS_DETAILS_ENTRY);
    let back: ClassDetails = serde_json::from_slice(&text).expect("json");
    assert_eq!(back, details());
}

#[test]
fn empty_session_has_no_sheet_and_no_signatures() {
    let archive = build_export(None, &[]).expect("export");
    assert_eq!(archive.file_name, FALLBACK_FILE_NAME);
    let mut zip = open(&archive.bytes);
    assert_eq!(names(&mut zip), vec![MANIFEST_ENTRY.to_string()]);
}

#[test]
fn sheet_without_class_details_starts_at_column_header() {
    let records = vec![record("1", "Doe, Jane", "3/4/2026, 3:07:09 PM", None)];
    let sheet = sign_in_sheet(None, &records);
    assert_eq!(
        sheet,
        "Student Name,Student ID,Time In,Time Out\n\"Doe, Jane\",1,\"3/4/2026, 3:07:09 PM\",\n"
    );
    assert_eq!(export_file_name(None), "lab_check_export.zip");
}

#[test]
fn manifest_lists_every_entry_with_digest() {
    let records = vec![
        record("1", "Ann", "T1", Some(("T2", PNG_OUT_URL))),
        record("2", "Bo", "T3", None),
    ];
    let archive = build_export(Some(&details()), &records).expect("export");
    assert_eq!(archive.entries.last().map(String::as_str), Some(MANIFEST_ENTRY));

    let mut zip = open(&archive.bytes);
    let manifest: serde_json::Value =
        serde_json::from_slice(&read_entry(&mut zip, MANIFEST_ENTRY)).expect("manifest json");
    assert_eq!(manifest["format"], "labcheck-export-v1");
    assert_eq!(manifest["exportId"], archive.export_id.as_str());
    assert_eq!(manifest["recordCount"], 2);

    let listed = manifest["entries"].as_array().expect("entries array");
    assert_eq!(listed.len(), archive.entries.len() - 1);
    for item in listed {
        let name = item["name"].as_str().expect("name");
        let bytes = read_entry(&mut zip, name);
        assert_eq!(item["size"], bytes.len());
        assert_eq!(
            item["sha256"].as_str(),
            Some(format!("{:x}", Sha256::digest(&bytes)).as_str())
        );
    }
}

#[test]
fn repeated_id_keeps_first_signature_entry() {
    let mut second = record("1", "Ann again", "T9", None);
    second.signature_in = SignatureImage::new(PNG_OUT_URL);
    let records = vec![record("1", "Ann", "T1", None), second];
    let archive = build_export(None, &records).expect("export");
    let mut zip = open(&archive.bytes);
    assert_eq!(read_entry(&mut zip, "signatures/1_signin.png"), b"PNGDATA");
}

#[test]
fn undecodable_signature_fails_the_export() {
    let mut bad = record("5", "Cy", "T1", None);
    bad.signature_in = SignatureImage::new("data:image/png;base64,***");
    let err = build_export(Some(&details()), &[bad]).expect_err("bad signature");
    assert_eq!(
        err,
        ExportError::InvalidSignature {
            id: "5".to_string(),
            kind: SignatureKind::SignIn,
        }
    );
}

#[test]
fn jpeg_signature_keeps_its_extension() {
    let mut r = record("8", "Di", "T1", None);
    r.signature_in = SignatureImage::new("data:image/jpeg;base64,UE5HREFUQQ==");
    let archive = build_export(None, &[r]).expect("export");
    assert!(archive
        .entries
        .iter()
        .any(|n| n == "signatures/8_signin.jpg"));
}

#[test]
fn signature_entry_names_stay_inside_signatures_dir() {
    let records = vec![
        record("../../evil", "Eve", "T1", None),
        record("a\\b/c", "Al", "T2", None),
    ];
    let archive = build_export(None, &records).expect("export");
    let sigs: Vec<&str> = archive
        .entries
        .iter()
        .map(String::as_str)
        .filter(|n| n.starts_with("signatures/"))
        .collect();
    assert_eq!(
        sigs,
        vec!["signatures/____evil_signin.png", "signatures/a_b_c_signin.png"]
    );
    assert!(archive.entries.iter().all(|n| !n.contains("..")));

    // The sheet keeps the id as entered.
    let mut zip = open(&archive.bytes);
    let sheet = String::from_utf8(read_entry(&mut zip, SHEET_ENTRY)).expect("utf8");
    assert!(sheet.contains("Eve,../../evil,T1,"), "{sheet}");
}

#[test]
fn empty_signature_payload_writes_empty_image() {
    let mut r = record("4", "Flo", "T1", None);
    r.signature_in = SignatureImage::new("data:image/png;base64,");
    let archive = build_export(None, &[r]).expect("export");
    let mut zip = open(&archive.bytes);
    assert!(read_entry(&mut zip, "signatures/4_signin.png").is_empty());
}
