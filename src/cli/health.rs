//! Backend health probe

use std::error::Error;

use crate::api::ApiClient;
use crate::core::config::Config;

pub async fn run_health(config: &Config) -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(
        &config.base_url(),
        config.request_timeout(),
        config.max_question_length(),
    )?;

    match client.check_health().await {
        Ok(health) => {
            println!(
                "API: {} — {} v{}",
                health.status,
                health.service.as_deref().unwrap_or("unknown service"),
                health.version.as_deref().unwrap_or("?")
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("API offline — {err}");
            std::process::exit(1);
        }
    }
}
