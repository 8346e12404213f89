use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Name,
    Id,
    Other,
}

pub fn normalize_header(s: &str) -> String {
    s.trim().to_lowercase()
}

/// "name" wins over "id" when a header contains both.
pub fn classify_header(header: &str) -> ColumnKind {
    let h = normalize_header(header);
    if h.contains("name") {
        ColumnKind::Name
    } else if h.contains("id") {
        ColumnKind::Id
    } else {
        ColumnKind::Other
    }
}

/// True when some header satisfies `token` directly or through the word
/// "student" ("Student" alone is accepted for both name and id).
pub fn headers_cover_token(headers: &[String], token: &str) -> bool {
    headers.iter().any(|h| {
        let h = normalize_header(h);
        h.contains(token) || h.contains("student")
    })
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Makes `s` usable as a single path component: separators become `_` and
/// `..` cannot survive to climb out of the parent directory.
pub fn path_component(s: &str) -> String {
    let flat: String = s
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    flat.replace("..", "_")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvError {
    pub row: usize,
    pub message: String,
}

/// Splits CSV text into records. Handles quoted fields with embedded commas,
/// doubled quotes and line breaks; accepts LF or CRLF; strips a leading BOM;
/// skips blank lines.
pub fn parse_csv_records(text: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut quoted_field = false;
    let mut line = 1usize;
    let mut quote_opened_on = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    buf.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    buf.push(ch);
                }
                _ => buf.push(ch),
            }
            continue;
        }
        match ch {
            '"' if buf.is_empty() && !quoted_field => {
                in_quotes = true;
                quoted_field = true;
                quote_opened_on = line;
            }
            ',' => {
                record.push(std::mem::take(&mut buf));
                quoted_field = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut buf));
                quoted_field = false;
                push_record(&mut records, std::mem::take(&mut record));
                line += 1;
            }
            _ => buf.push(ch),
        }
    }

    if in_quotes {
        return Err(CsvError {
            row: quote_opened_on,
            message: format!("Unterminated quoted field starting on line {}", quote_opened_on),
        });
    }
    if !buf.is_empty() || !record.is_empty() || quoted_field {
        record.push(buf);
        push_record(&mut records, record);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Decodes a `data:<mime>;base64,<payload>` URL. Input without the `data:`
/// prefix is taken as a bare base64 payload.
pub fn decode_data_url(blob: &str) -> Option<DecodedImage> {
    let blob = blob.trim();
    let (mime, payload) = match blob.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest.split_once(',')?;
            let mime = meta.split(';').next().unwrap_or("");
            (mime, payload)
        }
        None => ("", blob),
    };
    // An empty payload decodes to an empty image.
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes()).ok()?;
    Some(DecodedImage {
        extension: extension_for_mime(mime),
        bytes,
    })
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
