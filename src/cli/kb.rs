//! Knowledge-base entry management
//!
//! Thin passthrough to the client's CRUD operations; the backend owns all
//! validation beyond the obvious.

use std::error::Error;

use clap::Subcommand;

use crate::api::{ApiClient, KbEntry, KbEntryPatch, NewKbEntry};
use crate::core::config::Config;

#[derive(Subcommand)]
pub enum KbCommands {
    /// List entries, optionally filtered by service
    List {
        /// Only show entries for this service key
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Add a new documentation entry
    Add {
        #[arg(long)]
        service: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Update fields of an existing entry
    Set {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags; replaces the existing set
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Delete an entry
    Rm { id: String },
}

pub async fn run_kb(command: KbCommands, config: &Config) -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(
        &config.base_url(),
        config.request_timeout(),
        config.max_question_length(),
    )?;

    match command {
        KbCommands::List { service } => {
            let entries = match client.list_kb_entries(service.as_deref()).await {
                Ok(entries) => entries,
                Err(err) => fail(err),
            };
            if entries.is_empty() {
                println!("No entries found.");
                return Ok(());
            }
            for entry in entries {
                print_entry(&entry);
            }
        }
        KbCommands::Add {
            service,
            title,
            url,
            description,
            tags,
        } => {
            if title.trim().is_empty() {
                eprintln!("Title is required.");
                std::process::exit(1);
            }
            let entry = NewKbEntry {
                service_key: service,
                title: title.trim().to_string(),
                url,
                description,
                tags,
            };
            match client.create_kb_entry(&entry).await {
                Ok(created) => println!("Created entry {}.", created.id),
                Err(err) => fail(err),
            }
        }
        KbCommands::Set {
            id,
            title,
            url,
            description,
            tags,
        } => {
            let patch = KbEntryPatch {
                title,
                url,
                description,
                tags,
            };
            if patch.is_empty() {
                println!("No changes requested.");
                return Ok(());
            }
            match client.update_kb_entry(&id, &patch).await {
                Ok(updated) => println!("Updated entry {}.", updated.id),
                Err(err) => fail(err),
            }
        }
        KbCommands::Rm { id } => match client.delete_kb_entry(&id).await {
            Ok(()) => println!("Deleted entry {id}."),
            Err(err) => fail(err),
        },
    }
    Ok(())
}

fn print_entry(entry: &KbEntry) {
    println!("[{}] {} — {}", entry.id, entry.service_key, entry.title);
    if !entry.url.is_empty() {
        println!("    {}", entry.url);
    }
    if !entry.description.is_empty() {
        println!("    {}", entry.description);
    }
    if !entry.tags.is_empty() {
        println!("    tags: {}", entry.tags.join(", "));
    }
}

fn fail(err: crate::api::ApiError) -> ! {
    eprintln!("{err}");
    std::process::exit(1);
}
