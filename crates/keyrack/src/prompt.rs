// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password acquisition and interactive confirmations.
//!
//! The master password comes from the `KEYRACK_MASTER` environment
//! variable (for headless use) or an rpassword TTY prompt that never
//! echoes keystrokes. The vault itself never prompts; everything
//! interactive lives here.

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

use secrecy::SecretString;

use keyrack_core::VaultError;
use keyrack_vault::ExportConflictChoice;

/// The environment variable consulted before prompting.
pub const MASTER_ENV_VAR: &str = "KEYRACK_MASTER";

/// Get the master password from the environment or an interactive prompt.
pub fn master_password() -> Result<SecretString, VaultError> {
    if let Ok(value) = std::env::var(MASTER_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if std::io::stdin().is_terminal() {
        let password = read_password("Master password: ")?;
        return Ok(SecretString::from(password));
    }

    Err(VaultError::Usage(format!(
        "no master password provided; set {MASTER_ENV_VAR} or run interactively"
    )))
}

/// Get a new master password, prompting twice for confirmation.
///
/// Used by `init` and `rotate`; a mismatch between the two entries fails
/// before the vault is touched.
pub fn new_master_password() -> Result<SecretString, VaultError> {
    if let Ok(value) = std::env::var(MASTER_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if std::io::stdin().is_terminal() {
        let first = read_password("New master password: ")?;
        let second = read_password("Confirm master password: ")?;
        if first != second {
            return Err(VaultError::Usage(
                "master passwords do not match".to_string(),
            ));
        }
        return Ok(SecretString::from(first));
    }

    Err(VaultError::Usage(format!(
        "no master password provided; set {MASTER_ENV_VAR} or run interactively"
    )))
}

/// Prompt for the password of the credential being added.
pub fn credential_password(service: &str, username: &str) -> Result<SecretString, VaultError> {
    if !std::io::stdin().is_terminal() {
        // Headless add reads the credential password from stdin.
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(VaultError::storage)?;
        return Ok(SecretString::from(
            line.strip_suffix('\n').unwrap_or(&line).to_string(),
        ));
    }
    let password = read_password(&format!("Password for {service}/{username}: "))?;
    Ok(SecretString::from(password))
}

/// Ask what to do about an existing export target.
pub fn export_conflict(target: &Path) -> ExportConflictChoice {
    if !std::io::stdin().is_terminal() {
        // Without a terminal there is nobody to ask; never clobber.
        return ExportConflictChoice::Cancel;
    }
    loop {
        eprint!(
            "{} exists: [o]verwrite, [r]ename, [c]ancel? ",
            target.display()
        );
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return ExportConflictChoice::Cancel;
        }
        match line.trim().to_lowercase().as_str() {
            "o" | "overwrite" => return ExportConflictChoice::Overwrite,
            "r" | "rename" => return ExportConflictChoice::RenameAlternative,
            "c" | "cancel" | "" => return ExportConflictChoice::Cancel,
            _ => continue,
        }
    }
}

/// Parse a `--on-conflict` preset.
pub fn parse_conflict_choice(value: &str) -> Result<ExportConflictChoice, VaultError> {
    match value {
        "overwrite" => Ok(ExportConflictChoice::Overwrite),
        "rename" => Ok(ExportConflictChoice::RenameAlternative),
        "cancel" => Ok(ExportConflictChoice::Cancel),
        other => Err(VaultError::Usage(format!(
            "invalid conflict choice: {other} (expected overwrite, rename, or cancel)"
        ))),
    }
}

/// Confirm the destructive full replace an import performs.
pub fn confirm_replace(existing: usize) -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }
    eprint!("Import replaces all {existing} stored credentials. Continue? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn read_password(prompt_text: &str) -> Result<String, VaultError> {
    eprint!("{prompt_text}");
    let _ = std::io::stderr().flush();
    rpassword::read_password()
        .map_err(|e| VaultError::Usage(format!("failed to read password: {e}")))
}
