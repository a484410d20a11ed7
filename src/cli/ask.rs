//! One-shot "ask" command

use std::error::Error;
use std::sync::Arc;

use crate::api::{ApiClient, AskBackend};
use crate::core::config::Config;
use crate::core::services::ServiceCatalog;
use crate::core::session::ChatSession;

pub async fn run_ask(question: Vec<String>, config: &Config) -> Result<(), Box<dyn Error>> {
    let question = question.join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: askdocs ask <question>");
        std::process::exit(1);
    }

    let client = Arc::new(ApiClient::new(
        &config.base_url(),
        config.request_timeout(),
        config.max_question_length(),
    )?);

    let mut catalog = ServiceCatalog::new(config.service_cache_ttl(), config.service_names.clone());
    // Catalog failures only affect display names.
    let _ = catalog.refresh_if_stale(&client).await;

    let backend: Arc<dyn AskBackend> = client.clone();
    let mut session = ChatSession::new(backend, config);
    session.new_chat();
    if let Err(err) = session.submit_question(&question).await {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let Some(reply) = session.active_messages().iter().rev().find(|m| m.is_assistant()) else {
        eprintln!("The backend returned no answer.");
        std::process::exit(1);
    };

    if reply.is_failure() {
        eprintln!("{}", reply.text);
        std::process::exit(1);
    }

    println!("{}", reply.text);
    if let Some(meta) = reply.meta.as_ref() {
        if !meta.services.is_empty() {
            let names: Vec<String> = meta
                .services
                .iter()
                .map(|key| catalog.display_name(key))
                .collect();
            println!();
            println!("Services: {}", names.join(", "));
        }
        if let Some(confidence) = meta.confidence {
            println!("Confidence: {:.0}%", confidence * 100.0);
        }
        for link in &meta.links {
            println!("- {} — {}", link.title, link.url);
        }
        if !meta.pipeline.is_empty() {
            println!("Pipeline: {}", meta.pipeline.join(", "));
        }
    }

    Ok(())
}
