//! `patentfetch check`: verify the setup before starting a long batch.

use std::path::Path;

use console::style;
use patentfetch_common::AllowlistClient;
use patentfetch_config::Config;
use patentfetch_retrieval::input::read_identifiers;
use patentfetch_retrieval::sources::google_patents::GooglePatentsClient;
use tracing::warn;

type CheckResult = Result<String, String>;

/// Run every check, print one line each, and return whether all passed.
pub async fn run(config_path: Option<&Path>, input: Option<&Path>) -> bool {
    let mut results = Vec::new();

    let config = match crate::load_config(config_path) {
        Ok(c) => {
            results.push(Ok("Configuration is valid".to_string()));
            c
        }
        Err(e) => {
            results.push(Err(format!("{e:#}")));
            Config::default()
        }
    };

    results.push(check_output_dir(&config.output.dir).await);

    match GooglePatentsClient::new(&config.retrieval) {
        Ok(source) => {
            results.push(check_reachable(source.http(), &config.retrieval.detail_base_url).await);
            results.push(check_reachable(source.http(), &config.retrieval.asset_host).await);
        }
        Err(e) => results.push(Err(format!("HTTP client: {e}"))),
    }

    if let Some(path) = input {
        results.push(check_input(path, &config.input.column));
    }

    let mut ok = true;
    for r in &results {
        match r {
            Ok(msg) => println!("{} {msg}", style("[OK]").green()),
            Err(msg) => {
                ok = false;
                println!("{} {msg}", style("[X]").red());
            }
        }
    }
    println!();
    if ok {
        println!("{}", style("Ready to download.").green().bold());
    } else {
        println!("{}", style("Setup has problems; fix the [X] items above.").red().bold());
    }
    ok
}

async fn check_output_dir(dir: &Path) -> CheckResult {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("Cannot create output directory {}: {e}", dir.display()))?;

    let probe = dir.join(".patentfetch-write-check");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| format!("Output directory {} is not writable: {e}", dir.display()))?;
    if let Err(e) = tokio::fs::remove_file(&probe).await {
        warn!("Could not remove {}: {e}", probe.display());
    }

    Ok(format!("Output directory {} is writable", dir.display()))
}

/// Any HTTP response counts as reachable; only transport errors fail.
async fn check_reachable(client: &AllowlistClient, url: &str) -> CheckResult {
    let request = client.get(url).map_err(|e| format!("{url}: {e}"))?;
    match request.send().await {
        Ok(resp) => Ok(format!("{url} reachable (HTTP {})", resp.status().as_u16())),
        Err(e) => Err(format!("{url} unreachable: {e}")),
    }
}

fn check_input(path: &Path, column: &str) -> CheckResult {
    read_identifiers(path, column)
        .map(|ids| format!("{} lists {} identifiers", path.display(), ids.len()))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_output_dir_created_and_probe_removed() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a/b");

        let msg = check_output_dir(&dir).await.unwrap();

        assert!(msg.contains("writable"));
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_output_dir_under_a_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = check_output_dir(&file.path().join("out")).await.unwrap_err();
        assert!(err.starts_with("Cannot create output directory"));
    }

    #[test]
    fn test_input_check_reports_count_or_missing_column() {
        let root = tempfile::tempdir().unwrap();
        let csv = root.path().join("list.csv");
        std::fs::write(&csv, "Display Key,Title\nUS1,a\nUS2,b\n").unwrap();

        assert!(check_input(&csv, "Display Key").unwrap().ends_with("lists 2 identifiers"));
        let err = check_input(&csv, "Patent").unwrap_err();
        assert!(err.contains("Display Key"), "available columns listed: {err}");
    }

    #[tokio::test]
    async fn test_refused_host_fails_without_request() {
        let client = AllowlistClient::new("test", std::time::Duration::from_secs(1)).unwrap();
        let err = check_reachable(&client, "https://example.com/").await.unwrap_err();
        assert!(err.starts_with("https://example.com/:"));
    }
}
