//! Service catalog listing

use std::error::Error;

use crate::api::ApiClient;
use crate::core::config::Config;
use crate::core::services::ServiceCatalog;

pub async fn run_services(config: &Config) -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(
        &config.base_url(),
        config.request_timeout(),
        config.max_question_length(),
    )?;
    let mut catalog = ServiceCatalog::new(config.service_cache_ttl(), config.service_names.clone());

    if let Err(err) = catalog.refresh(&client).await {
        eprintln!("Could not fetch the service catalog ({err}).");
        if config.service_names.is_empty() {
            std::process::exit(1);
        }
        eprintln!("Showing configured fallback names:");
        let mut fallback: Vec<_> = config.service_names.iter().collect();
        fallback.sort();
        for (key, name) in fallback {
            println!("{key:<24} {name}");
        }
        return Ok(());
    }

    println!("{:<24} {:<32} {:>8}", "KEY", "SERVICE", "DOCS");
    for service in catalog.services() {
        println!(
            "{:<24} {:<32} {:>8}",
            service.key, service.display_name, service.doc_count
        );
        if !service.description.is_empty() {
            println!("  {}", service.description);
        }
    }
    Ok(())
}
