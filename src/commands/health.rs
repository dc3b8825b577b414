use colored::Colorize;
use lexsearch::error::{Result, SearchError};
use serde_json::Value;

use super::runtime;

pub fn cmd_health(endpoint: &str) -> Result<()> {
    let url = format!("{}/api/health", endpoint.trim_end_matches('/'));

    let rt = runtime()?;
    let body: Value = rt.block_on(async {
        let resp = reqwest::get(&url).await.map_err(|e| unreachable(&url, e))?;
        if !resp.status().is_success() {
            return Err(unreachable(&url, format!("HTTP {}", resp.status())));
        }
        resp.json::<Value>().await.map_err(|e| unreachable(&url, e))
    })?;

    let status = body.get("status").and_then(Value::as_str).unwrap_or("unknown");
    if status == "ok" {
        println!("{} {} is healthy", "OK".green().bold(), endpoint);
        Ok(())
    } else {
        Err(unreachable(&url, format!("status '{}'", status)))
    }
}

fn unreachable(url: &str, reason: impl std::fmt::Display) -> SearchError {
    SearchError::Io(std::io::Error::other(format!(
        "health check {} failed: {}",
        url, reason
    )))
}
