use clap::Args;
use lsifkit_core::{IndexReport, Indexer, IndexerConfig, JsonFactsProvider, JsonLinesSink};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Facts dump produced by the language front-end
    #[arg(value_name = "FACTS")]
    pub facts: PathBuf,

    /// Output file for the LSIF records
    #[arg(short, long, default_value = "dump.lsif")]
    pub output: PathBuf,

    /// JSON config file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Module path of the project, e.g. example.com/app
    #[arg(long)]
    pub module_name: Option<String>,

    #[arg(long)]
    pub module_version: Option<String>,

    /// Unit workers; 0 uses every core
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Keep package data cached for the whole run
    #[arg(long)]
    pub no_evict: bool,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn run(args: IndexArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args)?;
    let provider = JsonFactsProvider::from_path(&args.facts)?;
    let file = File::create(&args.output)?;
    let sink = JsonLinesSink::new(BufWriter::new(file));

    info!(
        "Indexing {} into {}...",
        args.facts.display(),
        args.output.display()
    );
    let indexer = Indexer::new(config, Arc::new(provider), Box::new(sink));

    let cancel = indexer.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; stopping after in-flight units");
            cancel.cancel();
        }
    });

    let report = indexer.index().await?;
    info!("Indexing complete!");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_report(&report));
    }
    Ok(())
}

fn resolve_config(args: &IndexArgs) -> Result<IndexerConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => IndexerConfig::load(path)?,
        None => IndexerConfig::default(),
    };

    if let Some(root) = &args.project_root {
        config.project_root = absolute(root)?;
    } else if args.config.is_none() {
        config.project_root = std::env::current_dir()?;
    }
    if let Some(name) = &args.module_name {
        config.module_name = name.clone();
    }
    if let Some(version) = &args.module_version {
        config.module_version = version.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.no_evict {
        config.evict_released = false;
    }
    config.tool_info.args = std::env::args().skip(1).collect();
    Ok(config)
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn render_report(report: &IndexReport) -> String {
    let stats = &report.stats;
    let rows = vec![
        row("Documents", report.documents),
        row("Units", stats.units),
        row("Vertices", stats.vertices),
        row("Edges", stats.edges),
        row("Cache hits", stats.cache_hits),
        row("Cache misses", stats.cache_misses),
        row("Cache evictions", stats.cache_evictions),
        StatRow {
            metric: "Cache hit rate",
            value: format!("{:.1}%", stats.cache_hit_rate() * 100.0),
        },
        row("Skipped occurrences", stats.skipped_occurrences),
        row("Inconsistencies", stats.inconsistencies),
        StatRow {
            metric: "Elapsed",
            value: format!("{:.2?}", report.elapsed),
        },
    ];
    Table::new(rows).with(Style::psql()).to_string()
}

fn row(metric: &'static str, value: impl ToString) -> StatRow {
    StatRow {
        metric,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsifkit_core::{CacheStats, StatsSnapshot};
    use std::time::Duration;

    fn args(facts: &str) -> IndexArgs {
        IndexArgs {
            facts: PathBuf::from(facts),
            output: PathBuf::from("dump.lsif"),
            config: None,
            project_root: Some(PathBuf::from("/repo")),
            module_name: Some("example.com/app".to_string()),
            module_version: None,
            workers: Some(3),
            no_evict: true,
            json: false,
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lsifkit.json");
        std::fs::write(
            &path,
            r#"{"projectRoot": "/other", "moduleVersion": "v2.0.0", "workers": 8}"#,
        )
        .unwrap();

        let config = resolve_config(&IndexArgs {
            config: Some(path),
            ..args("facts.json")
        })
        .unwrap();

        assert_eq!(config.project_root, PathBuf::from("/repo"));
        assert_eq!(config.module_name, "example.com/app");
        assert_eq!(config.module_version, "v2.0.0");
        assert_eq!(config.workers, 3);
        assert!(!config.evict_released);
    }

    #[test]
    fn report_table_lists_counters() {
        let report = IndexReport {
            stats: StatsSnapshot {
                vertices: 12,
                edges: 9,
                cache_hits: 3,
                cache_misses: 1,
                ..StatsSnapshot::default()
            },
            cache: CacheStats::default(),
            documents: 2,
            elapsed: Duration::from_millis(15),
        };
        let table = render_report(&report);
        assert!(table.contains("Vertices"));
        assert!(table.contains("75.0%"));
    }
}
