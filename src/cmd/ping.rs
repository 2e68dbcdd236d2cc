//! Connectivity test for both projects — `shipops ping`.

use anyhow::Result;

use super::super::Cli;
use shipops::rest::{ProjectClient, RetryPolicy, reachable, with_retry};
use shipops::ui::icons;

pub async fn cmd_ping(cli: &Cli) -> Result<()> {
    use shipops::config::OpsConfig;

    let config = OpsConfig::load_or_default(&cli.config)?;
    let source = config.require_source()?;
    let target = config.require_target()?;

    let bar = "=".repeat(60);
    println!("{bar}");
    println!("CONNECTION TEST");
    println!("{bar}");

    let source_ok = probe_project(
        "source (anon)",
        &source.url,
        &source.key,
        "rest/v1/profiles?limit=0",
    )
    .await;
    let target_ok = probe_project(
        "target (anon)",
        &target.url,
        &target.key,
        "rest/v1/profiles?limit=0",
    )
    .await;
    let service_ok = match &target.service_key {
        Some(key) => Some(probe_project("target (service role)", &target.url, key, "rest/v1/").await),
        None => {
            println!("\n{}Testing target (service role)...", icons::PROBE);
            println!("  skipped: no service key configured");
            None
        }
    };

    println!("\n{bar}");
    println!("RESULTS");
    println!("{bar}");
    println!("Source (anon):            {}", verdict(source_ok));
    println!("Target (anon):            {}", verdict(target_ok));
    match service_ok {
        Some(ok) => println!("Target (service role):    {}", verdict(ok)),
        None => println!("Target (service role):    - skipped"),
    }
    println!("{bar}");

    if source_ok && target_ok && service_ok.unwrap_or(true) {
        println!("\n✓ All connections OK. Ready to migrate.");
        Ok(())
    } else {
        anyhow::bail!("some connections failed; check credentials")
    }
}

/// Hits one endpoint with one key and reports the outcome. A 404 or 406
/// still proves the endpoint and key work, so both count as reachable.
async fn probe_project(name: &str, url: &str, key: &str, path: &str) -> bool {
    println!("\n{}Testing {name}...", icons::PROBE);
    println!("  URL: {url}");

    let client = match ProjectClient::new(url, key) {
        Ok(client) => client,
        Err(err) => {
            println!("  ✗ Client error: {err}");
            return false;
        }
    };

    let policy = RetryPolicy::none();
    match with_retry(&policy, || client.probe(path)).await {
        Ok(status) if reachable(status) => {
            println!("  ✓ Connected (HTTP {status})");
            true
        }
        Ok(401) => {
            println!("  ✗ Authentication failed: invalid key");
            false
        }
        Ok(status) => {
            println!("  ✗ Connection failed: HTTP {status}");
            false
        }
        Err(err) => {
            println!("  ✗ Connection error: {err}");
            false
        }
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok { "✓ OK" } else { "✗ FAIL" }
}
