//! CSV ingestion with encoding and delimiter auto-detection.
//!
//! Converts CSV rows into JSON objects with dynamically typed cells
//! (numbers, booleans, null for empty cells). No evaluation-specific
//! logic here: the normalizer decides what the columns mean.

use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed records as JSON objects
    pub records: Vec<Value>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers (trimmed)
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always UTF-8; chardet is only consulted for other input.
/// Latin-1 guesses are read as windows-1252, and guesses `encoding_rs` does
/// not know fall back to windows-1252 too.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0.to_lowercase();
    match charset.as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" | "windows-1252" | "cp1252" | "" => {
            "windows-1252".to_string()
        }
        label if encoding_rs::Encoding::for_label(label.as_bytes()).is_some() => {
            label.to_string()
        }
        _ => "windows-1252".to_string(),
    }
}

/// Decode bytes using a WHATWG encoding label.
///
/// Latin-1 labels decode as windows-1252. A leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    let codec = encoding_rs::Encoding::for_label(encoding.trim().as_bytes())
        .ok_or_else(|| LoadError::Encoding(format!("unsupported encoding '{}'", encoding)))?;
    let (decoded, _, _) = codec.decode(bytes);

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to `,` when no candidate occurs.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Type a raw cell: empty → null, `true`/`false` → bool, numeric literal → number.
///
/// Values are kept untrimmed when they stay strings.
pub fn infer_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match raw {
        "true" | "TRUE" | "True" => return Value::Bool(true),
        "false" | "FALSE" | "False" => return Value::Bool(false),
        _ => {}
    }

    let candidate = raw.trim();
    if looks_numeric(candidate) {
        if let Ok(i) = candidate.parse::<i64>() {
            return Value::Number(i.into());
        }
        if let Some(n) = candidate.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    Value::String(raw.to_string())
}

/// Plain decimal literal: optional sign, digits with an optional fraction, optional exponent.
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());

    let mantissa_ok = match frac_part {
        Some(frac) => {
            (!int_part.is_empty() || !frac.is_empty()) && digits(int_part) && digits(frac)
        }
        None => !int_part.is_empty() && digits(int_part),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

/// Parse CSV text into JSON objects with an explicit delimiter.
///
/// Each row becomes a JSON object keyed by the trimmed headers.
/// Missing trailing cells become null, extra cells are ignored.
///
/// # Example
/// ```ignore
/// use evalboard::parse_str;
///
/// let rows = parse_str("student_name,final_score\nAna,720", ',').unwrap();
/// assert_eq!(rows[0]["student_name"], "Ana");
/// assert_eq!(rows[0]["final_score"], 720);
/// ```
pub fn parse_str(content: &str, delimiter: char) -> LoadResult<Vec<Value>> {
    parse_string_with_metadata(content, delimiter, "utf-8".to_string()).map(|r| r.records)
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> LoadResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter).map_err(|_| LoadError::Csv {
        line: 1,
        message: format!("Unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(&e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::NoHeaders);
    }

    let mut records = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| csv_error(&e))?;

        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).map(infer_value).unwrap_or(Value::Null);
            obj.insert(header.clone(), value);
        }

        records.push(Value::Object(obj));
    }

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

fn csv_error(err: &csv::Error) -> LoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    LoadError::Csv {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> LoadResult<ParseResult> {
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("/path/to/evaluations.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Records: {}", result.records.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> LoadResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}
