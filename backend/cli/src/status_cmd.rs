//! CLI Status Command
//!
//! Reports provider, model and session usage of a running server.

use std::time::Duration;

use anyhow::{Context, Result};
use diagramlens_config::DiagramLensConfig;
use serde_json::Value;

use crate::terminal_output::{note_error, note_success};

pub async fn run(config: &DiagramLensConfig, url: Option<String>) -> Result<()> {
    let base = url.unwrap_or_else(|| default_url(config));
    let endpoint = format!("{}/api/health", base.trim_end_matches('/'));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let response = match client.get(&endpoint).send().await {
        Ok(r) => r,
        Err(e) => {
            note_error(&format!("DiagramLens is not reachable at {base}: {e}"));
            return Err(e.into());
        }
    };
    let health: Value = response
        .error_for_status()?
        .json()
        .await
        .context("Health endpoint returned invalid JSON")?;

    note_success(&format!("DiagramLens is running at {base}"));
    print!("{}", summarize(&health));
    Ok(())
}

/// Loopback URL for the configured port; an unspecified bind address is
/// reached through localhost.
fn default_url(config: &DiagramLensConfig) -> String {
    let host = match config.bind() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    if host.contains(':') {
        format!("http://[{host}]:{}", config.port())
    } else {
        format!("http://{host}:{}", config.port())
    }
}

fn summarize(health: &Value) -> String {
    let field = |name: &str| match &health[name] {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    };
    format!(
        "  Version:  {}\n  Provider: {} ({})\n  Sessions: {} of {}\n  Uptime:   {}s\n",
        field("version"),
        field("provider"),
        field("model"),
        field("sessions"),
        field("max_sessions"),
        field("uptime_seconds"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagramlens_config::schema::ServerConfig;

    #[test]
    fn default_url_uses_loopback_for_wildcard_bind() {
        let config = DiagramLensConfig {
            server: Some(ServerConfig {
                bind: Some("0.0.0.0".into()),
                port: Some(9000),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(default_url(&config), "http://127.0.0.1:9000");
    }

    #[test]
    fn summary_lists_health_fields() {
        let health = serde_json::json!({
            "status": "ok",
            "version": "0.1.0",
            "provider": "mock",
            "model": "mock",
            "sessions": 2,
            "max_sessions": 100,
            "uptime_seconds": 42
        });
        let text = summarize(&health);
        assert!(text.contains("Provider: mock (mock)"));
        assert!(text.contains("Sessions: 2 of 100"));
        assert!(text.contains("Uptime:   42s"));
    }
}
