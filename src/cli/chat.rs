//! Interactive line-based chat session.
//!
//! A deliberately plain rendering surface: it pulls session state through
//! the controller's query operations and redraws after each action, so it
//! imposes no ordering requirements on the core.

use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::api::{ApiClient, AskBackend};
use crate::core::config::Config;
use crate::core::conversation::ConversationId;
use crate::core::message::Message;
use crate::core::services::ServiceCatalog;
use crate::core::session::{ChatSession, SessionState, SubmitError};
use crate::utils::export::conversation_markdown;

pub async fn run_chat(config: &Config) -> Result<(), Box<dyn Error>> {
    let client = Arc::new(ApiClient::new(
        &config.base_url(),
        config.request_timeout(),
        config.max_question_length(),
    )?);
    let mut catalog = ServiceCatalog::new(config.service_cache_ttl(), config.service_names.clone());
    let _ = catalog.refresh_if_stale(&client).await;

    let backend: Arc<dyn AskBackend> = client.clone();
    let mut session = ChatSession::new(backend, config);
    session.new_chat();

    match client.check_health().await {
        Ok(health) => println!(
            "Connected to {} ({}, v{})",
            client.base_url(),
            health.status,
            health.version.as_deref().unwrap_or("?")
        ),
        Err(err) => println!("Warning: {err}"),
    }
    print_suggestions(&session);
    println!("Type /help for chat commands.");

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &mut session, &mut catalog, &client).await? {
                break;
            }
            continue;
        }

        match session.submit_question(line).await {
            Ok(_) => {
                if let Some(reply) = session.active_messages().last() {
                    print_assistant_turn(reply, &catalog);
                }
                if let Some(banner) = session.take_banner() {
                    eprintln!("! {banner}");
                }
            }
            Err(err @ SubmitError::InvalidQuestion(_)) => eprintln!("! {err}"),
            Err(err @ SubmitError::NoActiveConversation) => {
                eprintln!("! {err}");
                session.new_chat();
            }
        }
    }

    Ok(())
}

/// Returns false when the user asked to quit.
async fn handle_command(
    command: &str,
    session: &mut ChatSession,
    catalog: &mut ServiceCatalog,
    client: &ApiClient,
) -> Result<bool, Box<dyn Error>> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let argument = parts.next();

    match name {
        "quit" | "exit" | "q" => return Ok(false),
        "new" => {
            session.new_chat();
            println!("Started a new conversation.");
            print_suggestions(session);
        }
        "list" => {
            let active = session.active_id();
            for summary in session.conversations() {
                let marker = if Some(summary.id) == active { "*" } else { " " };
                let title = summary.title.as_deref().unwrap_or("(draft)");
                println!("{marker} {:>4}  {title}", summary.id);
            }
        }
        "switch" => match parse_conversation_id(session, argument) {
            Some(id) => match session.switch_chat(id) {
                Ok(state) => {
                    println!("Switched to conversation {id}.");
                    if state == SessionState::ActiveWithHistory {
                        for message in session.active_messages() {
                            print_turn(message, catalog);
                        }
                    } else {
                        print_suggestions(session);
                    }
                }
                Err(err) => eprintln!("! {err}"),
            },
            None => eprintln!("Usage: /switch <id> (see /list)"),
        },
        "delete" => match parse_conversation_id(session, argument) {
            Some(id) => match session.delete_chat(id) {
                Ok(_) => println!("Deleted conversation {id}."),
                Err(err) => eprintln!("! {err}"),
            },
            None => eprintln!("Usage: /delete <id> (see /list)"),
        },
        "export" => match (argument, session.active_conversation()) {
            (Some(path), Some(conversation)) => {
                let markdown =
                    conversation_markdown(conversation, |key| catalog.display_name(key));
                fs::write(path, markdown)?;
                println!("Exported to {path}.");
            }
            (None, _) => eprintln!("Usage: /export <file>"),
            (_, None) => eprintln!("Nothing to export yet."),
        },
        "services" => {
            let _ = catalog.refresh_if_stale(client).await;
            for service in catalog.services() {
                println!("{:<20} {} ({} docs)", service.key, service.display_name, service.doc_count);
            }
            if catalog.services().is_empty() {
                println!("Service catalog unavailable.");
            }
        }
        "help" => {
            println!("/new, /list, /switch <id>, /delete <id>, /export <file>, /services, /quit");
        }
        other => eprintln!("Unknown command: /{other} (try /help)"),
    }
    Ok(true)
}

fn parse_conversation_id(session: &ChatSession, argument: Option<&str>) -> Option<ConversationId> {
    let wanted: u64 = argument?.parse().ok()?;
    session
        .conversations()
        .into_iter()
        .map(|summary| summary.id)
        .find(|id| id.value() == wanted)
}

fn print_suggestions(session: &ChatSession) {
    if session.state() != SessionState::ActiveEmpty {
        return;
    }
    println!("Try one of these questions to get started:");
    for question in session.suggested_questions() {
        println!("  - {question}");
    }
}

fn print_turn(message: &Message, catalog: &ServiceCatalog) {
    if message.is_user() {
        println!("> {}", message.text);
    } else {
        print_assistant_turn(message, catalog);
    }
}

fn print_assistant_turn(message: &Message, catalog: &ServiceCatalog) {
    println!("{}", message.text);
    let Some(meta) = message.meta.as_ref() else {
        return;
    };
    if meta.is_error() {
        return;
    }
    if !meta.services.is_empty() {
        let names: Vec<String> = meta
            .services
            .iter()
            .map(|key| catalog.display_name(key))
            .collect();
        println!("  Services: {}", names.join(", "));
    }
    if let Some(confidence) = meta.confidence {
        println!("  Confidence: {:.0}%", confidence * 100.0);
    }
    for link in &meta.links {
        println!("  - {} — {}", link.title, link.url);
    }
    if !meta.pipeline.is_empty() {
        println!("  Pipeline: {}", meta.pipeline.join(", "));
    }
}
