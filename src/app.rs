use std::{fs, io, path::Path, path::PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    domain::{run_roster, ConfigurationError, ItemSource, ReferenceTable, Roster, RosterReport, RunOptions},
    infra::{
        spreadsheet::{load_reference_table, write_report, SheetError},
        wiki::{WikiClient, WikiClientError},
    },
    settings::Settings,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Client(#[from] WikiClientError),
    #[error("failed to read roster {path}: {source}")]
    Roster {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// reference table -> roster -> pricing run -> report, in that order.
pub async fn run_pipeline(settings: &Settings) -> Result<RosterReport, PipelineError> {
    let table = load_reference_table(&settings.reference, &settings.columns)?;
    let roster = load_roster(settings.roster.as_deref())?;

    let mut client = WikiClient::with_base_url(&settings.base_url)?;
    if let Some(path) = settings.cache_file() {
        client = client.with_disk_cache(path);
    }

    let report = price_roster(&roster, &table, &client, &settings.run_options()).await?;

    if let Err(err) = client.persist().await {
        warn!("Failed to persist item cache: {err}");
    }

    write_report(&settings.output, &report)?;
    Ok(report)
}

pub fn load_roster(path: Option<&Path>) -> Result<Roster, PipelineError> {
    let roster = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|source| PipelineError::Roster {
                path: path.to_path_buf(),
                source,
            })?;
            Roster::from_json(&raw)?
        }
        None => Roster::builtin()?,
    };
    info!(
        "Roster has {} operators in {} tiers",
        roster.entity_count(),
        roster.tiers.len()
    );
    Ok(roster)
}

/// Runs the roster and logs the audit summary.
pub async fn price_roster<S>(
    roster: &Roster,
    table: &ReferenceTable,
    source: &S,
    options: &RunOptions,
) -> Result<RosterReport, ConfigurationError>
where
    S: ItemSource + Sync,
{
    let report = run_roster(roster, table, source, options).await?;

    info!(
        grand_total = report.grand_total,
        operators = report.entity_count(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        stale = report.stale_entries().count(),
        "Roster priced"
    );
    for failure in &report.failures {
        warn!("Not included in total: {} ({})", failure.entity, failure.reason);
    }
    for entry in report.stale_entries() {
        warn!("Priced from stale cache: {}", entry.name);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    const PAGE_X: &str = r#"
        <div style="display:inline-block;position:relative"><a title="固源岩"></a><span>2</span></div>
        <div style="display:inline-block;position:relative"><a title="龙门币"></a><span>1w</span></div>
        <div style="display:inline-block;position:relative"><a title="未知物品"></a><span>1</span></div>
    "#;

    const PAGE_Y: &str = r#"
        <div style="display:inline-block;position:relative"><a title="固源岩"></a><span>5</span></div>
    "#;

    const ROSTER: &str = r#"{"tiers": [
        {"label": "6★", "baseline": 100.0, "entities": ["X"]},
        {"label": "1★", "baseline": 1.0, "entities": ["Y", "Missing", "Y"]}
    ]}"#;

    async fn fixture(dir: &Path) -> (MockServer, Settings) {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/X");
                then.status(200).body(PAGE_X);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/Y");
                then.status(200).body(PAGE_Y);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/Missing");
                then.status(404);
            })
            .await;

        let reference = dir.join("values.csv");
        fs::write(&reference, "物品名称,等效理智\n固源岩,2\n龙门币,0.004\n").unwrap();
        let roster = dir.join("roster.json");
        fs::write(&roster, ROSTER).unwrap();

        let settings = Settings {
            reference,
            roster: Some(roster),
            output: dir.join("report.json"),
            base_url: server.url("/w/"),
            use_cache: false,
            ..Settings::default()
        };
        (server, settings)
    }

    #[tokio::test]
    async fn end_to_end_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let (_server, settings) = fixture(dir.path()).await;

        let report = run_pipeline(&settings).await.unwrap();

        let rows: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.total_cost))
            .collect();
        assert_eq!(rows, [("X", 144.0), ("Y", 11.0), ("Y", 11.0)]);
        assert_eq!(report.grand_total, 166.0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].item, "未知物品");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].entity, "Missing");
        assert!(settings.output.exists());
    }

    #[tokio::test]
    async fn repeated_runs_write_identical_reports() {
        let dir = tempfile::tempdir().unwrap();
        let (_server, settings) = fixture(dir.path()).await;

        run_pipeline(&settings).await.unwrap();
        let first = fs::read(&settings.output).unwrap();
        run_pipeline(&settings).await.unwrap();
        let second = fs::read(&settings.output).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn repeated_runs_write_identical_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        let (_server, mut settings) = fixture(dir.path()).await;
        settings.output = dir.path().join("output.xlsx");

        run_pipeline(&settings).await.unwrap();
        let first = fs::read(&settings.output).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        run_pipeline(&settings).await.unwrap();
        let second = fs::read(&settings.output).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn duplicate_reference_rows_abort_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let (server, settings) = fixture(dir.path()).await;
        fs::write(&settings.reference, "物品名称,等效理智\n固源岩,2\n固源岩,3\n").unwrap();
        let any_page = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200);
            })
            .await;

        let err = run_pipeline(&settings).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Sheet(SheetError::Configuration(ConfigurationError::DuplicateItem(_)))
        ));
        any_page.assert_hits_async(0).await;
        assert!(!settings.output.exists());
    }

    #[test]
    fn missing_roster_file_names_the_path() {
        let err = load_roster(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn builtin_roster_is_used_by_default() {
        let roster = load_roster(None).unwrap();
        assert_eq!(roster.tiers.len(), 5);
    }
}
