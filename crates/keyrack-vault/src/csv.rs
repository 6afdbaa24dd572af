// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strict, lossless CSV interchange for the full credential set.
//!
//! The dialect is deliberately tiny: a fixed header, three bare fields
//! joined by commas, `\n` line endings, no quoting, no escaping, no BOM.
//! The parser rejects anything the builder could not itself have produced,
//! and validates the entire file before a single record is handed to the
//! caller -- import gains whole-file atomicity even though CSV has no
//! transaction concept.

use keyrack_core::{PlainCredential, VaultError};

/// The fixed header line.
pub const HEADER: &str = "service,username,password";

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Serialize the credential set into the canonical byte-for-byte form:
/// header, one line per record, `\n` after every line.
///
/// A field containing a comma, tab, or newline cannot be represented in
/// this dialect (the parser would see the wrong field count); such a
/// record fails the build before any output exists. The error names the
/// field, never its content.
pub fn build(rows: &[PlainCredential]) -> Result<String, VaultError> {
    let mut out = String::with_capacity(HEADER.len() + 1 + rows.len() * 32);
    out.push_str(HEADER);
    out.push('\n');
    for (index, row) in rows.iter().enumerate() {
        for (name, field) in [
            ("service", row.service.as_str()),
            ("username", row.username.as_str()),
            ("password", row.password.as_str()),
        ] {
            if field.contains([',', '\t', '\r', '\n']) {
                return Err(VaultError::validation(format!(
                    "record {}: {name} field contains a comma or control character \
                     the export format cannot represent",
                    index + 1
                )));
            }
        }
        out.push_str(&row.service);
        out.push(',');
        out.push_str(&row.username);
        out.push(',');
        out.push_str(&row.password);
        out.push('\n');
    }
    Ok(out)
}

/// Parse and fully validate an exported file.
///
/// Errors carry 1-based line numbers where a line is at fault. No record
/// is returned unless the whole file is valid.
pub fn parse(bytes: &[u8]) -> Result<Vec<PlainCredential>, VaultError> {
    if bytes.starts_with(&BOM) {
        return Err(VaultError::validation(
            "file begins with a UTF-8 byte-order mark",
        ));
    }
    if bytes.is_empty() {
        return Err(VaultError::validation("file is empty"));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| VaultError::validation("file is not valid UTF-8"))?;

    // Any carriage return means this is not a vault-produced file.
    if let Some(pos) = text.find('\r') {
        let line = text[..pos].matches('\n').count() + 1;
        return Err(VaultError::validation_at(
            "carriage return found; only \\n line endings are accepted",
            line,
        ));
    }

    let lines: Vec<&str> = text.split('\n').collect();
    if lines[0] != HEADER {
        return Err(VaultError::validation_at(
            format!("first line must be exactly \"{HEADER}\""),
            1,
        ));
    }

    let mut rows = Vec::new();
    for (index, line) in lines[1..].iter().enumerate() {
        let line_number = index + 2;
        if line.is_empty() {
            // A single empty element at the very end is the trailing
            // newline the builder always emits; anything else is a blank
            // line inside the data.
            if index == lines.len() - 2 {
                continue;
            }
            return Err(VaultError::validation_at("blank line", line_number));
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            return Err(VaultError::validation_at(
                format!("expected 3 comma-separated fields, found {}", fields.len()),
                line_number,
            ));
        }
        for field in &fields {
            if field.contains('\t') {
                return Err(VaultError::validation_at(
                    "field contains a tab character",
                    line_number,
                ));
            }
        }
        rows.push(PlainCredential {
            service: fields[0].to_string(),
            username: fields[1].to_string(),
            password: fields[2].to_string(),
        });
    }
    Ok(rows)
}
