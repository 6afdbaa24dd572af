// SPDX-FileCopyrightText: 2026 Keyrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! keyrack - a master-password-protected credential vault.
//!
//! This binary is a thin shell: it parses arguments, acquires passwords
//! without echo, asks the interactive confirmations, and maps each error
//! kind returned by the vault to a distinct exit code. All vault logic
//! lives in the library crates.

mod prompt;
mod render;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;

use keyrack_core::{SortDirection, SortField, VaultError};
use keyrack_vault::{ExportOutcome, ImportOutcome, RotationOutcome, Vault};

/// keyrack - a master-password-protected credential vault.
#[derive(Parser, Debug)]
#[command(name = "keyrack", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new vault store.
    Init,
    /// Encrypt and store a credential.
    Add { service: String, username: String },
    /// Print the decrypted password for a credential.
    Get { service: String, username: String },
    /// Delete a credential.
    Del { service: String, username: String },
    /// List stored (service, username) pairs. Never prints passwords.
    List {
        /// Column to order by: service or username.
        #[arg(long, default_value = "service")]
        sort: String,
        /// Direction: asc or desc.
        #[arg(long, default_value = "asc")]
        direction: String,
    },
    /// Export every credential as CSV.
    Export {
        path: PathBuf,
        /// What to do when the target file already exists:
        /// overwrite, rename, or cancel. Prompts when omitted.
        #[arg(long)]
        on_conflict: Option<String>,
    },
    /// Replace the vault contents from a CSV file (destructive).
    Import {
        path: PathBuf,
        /// Skip the destructive-replace confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Rotate the master password, re-encrypting every credential.
    Rotate,
    /// Show the store state and credential count.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = match keyrack_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("keyrack: configuration error: {e}");
            std::process::exit(exit_code_usage());
        }
    };
    if let Err(e) = keyrack_config::validate(&config) {
        eprintln!("keyrack: {e}");
        std::process::exit(exit_code(&e));
    }

    let vault = Vault::from_config(&config);
    if let Err(e) = run(cli.command, &vault) {
        eprintln!("keyrack: {e}");
        std::process::exit(exit_code(&e));
    }
}

fn run(command: Commands, vault: &Vault) -> Result<(), VaultError> {
    match command {
        Commands::Init => {
            let master = prompt::new_master_password()?;
            vault.init(&master)?;
            eprintln!("Vault initialized at {}", vault.store_path().display());
        }
        Commands::Add { service, username } => {
            let master = prompt::master_password()?;
            let password = prompt::credential_password(&service, &username)?;
            vault.add(&master, &service, &username, &password)?;
            eprintln!("Stored credential for {service}/{username}");
        }
        Commands::Get { service, username } => {
            let master = prompt::master_password()?;
            let password = vault.get(&master, &service, &username)?;
            // The decrypted password is the output; everything else goes
            // to stderr.
            println!("{}", password.expose_secret());
        }
        Commands::Del { service, username } => {
            let master = prompt::master_password()?;
            vault.delete(&master, &service, &username)?;
            eprintln!("Deleted credential for {service}/{username}");
        }
        Commands::List { sort, direction } => {
            let field = SortField::from_str(&sort)
                .map_err(|_| VaultError::Usage(format!("invalid sort field: {sort}")))?;
            let direction = SortDirection::from_str(&direction).map_err(|_| {
                VaultError::Usage(format!("invalid sort direction: {direction}"))
            })?;
            let entries = vault.list(field, direction)?;
            render::print_listing(&entries);
        }
        Commands::Export { path, on_conflict } => {
            let preset = on_conflict
                .as_deref()
                .map(prompt::parse_conflict_choice)
                .transpose()?;
            let master = prompt::master_password()?;
            match vault.export(&master, &path, |target| {
                preset.unwrap_or_else(|| prompt::export_conflict(target))
            })? {
                ExportOutcome::Written(dest) => {
                    eprintln!("Exported to {}", dest.display());
                }
                ExportOutcome::Cancelled => eprintln!("Export cancelled"),
            }
        }
        Commands::Import { path, yes } => {
            let master = prompt::master_password()?;
            match vault.import(&master, &path, |existing| {
                yes || prompt::confirm_replace(existing)
            })? {
                ImportOutcome::Replaced { imported } => {
                    eprintln!("Imported {imported} credentials (full replace)");
                }
                ImportOutcome::Cancelled => eprintln!("Import cancelled"),
            }
        }
        Commands::Rotate => {
            let old = prompt::master_password()?;
            let new = prompt::new_master_password()?;
            match vault.rotate_master(&old, &new)? {
                RotationOutcome::Rotated => eprintln!("Master password rotated"),
                RotationOutcome::Unchanged => {
                    eprintln!("New password matches the current one; nothing to do");
                }
            }
        }
        Commands::Status { json } => {
            let report = vault.status()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report)
                        .unwrap_or_else(|_| "{}".to_string())
                );
            } else {
                render::print_status(&report, vault.store_path());
            }
        }
    }
    Ok(())
}

/// Map each error kind to a distinct exit code. The vault returns error
/// kinds instead of throwing a control object to the top level; this is
/// the only place codes are assigned.
fn exit_code(err: &VaultError) -> i32 {
    match err {
        VaultError::Usage(_) => 2,
        VaultError::NotReady { .. } => 3,
        VaultError::Authentication => 4,
        VaultError::DuplicateKey { .. } => 5,
        VaultError::NotFound { .. } => 6,
        VaultError::Validation { .. } => 7,
        VaultError::Storage { .. } => 8,
        VaultError::Corrupted { .. } => 9,
    }
}

fn exit_code_usage() -> i32 {
    exit_code(&VaultError::Usage(String::new()))
}

/// Initializes the tracing subscriber. Diagnostics go to stderr so stdout
/// stays reserved for command output.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("keyrack=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
