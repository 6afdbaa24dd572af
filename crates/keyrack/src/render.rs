// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of listings and status output.

use std::path::Path;

use keyrack_core::{ListEntry, StatusReport};

/// Print the (service, username) listing as two aligned columns.
pub fn print_listing(entries: &[ListEntry]) {
    if entries.is_empty() {
        println!("(no credentials stored)");
        return;
    }
    let width = entries
        .iter()
        .map(|e| e.service.len())
        .max()
        .unwrap_or(0)
        .max("SERVICE".len());
    println!("{:width$}  {}", "SERVICE", "USERNAME");
    for entry in entries {
        println!("{:width$}  {}", entry.service, entry.username);
    }
}

/// Print the status report for `keyrack status`.
pub fn print_status(report: &StatusReport, store_path: &Path) {
    println!();
    println!("  keyrack status");
    println!("  {}", "-".repeat(35));
    println!("    State:       {}", report.state);
    println!("    Credentials: {}", report.credential_count);
    println!("    Store:       {}", store_path.display());
    println!();
}
