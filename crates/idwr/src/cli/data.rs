use clap::{Args, Subcommand};
use idwr_data::{CacheStatus, Dataset, FileOutcome};
use tabled::Tabled;

use super::Cache;
use crate::ui::table::Formatter;

#[derive(Debug, Subcommand)]
pub enum DataCommands {
    /// Download and verify every dataset, then print the directory.
    #[command(alias = "dl", name = "download")]
    Download(VersionArg),
    /// Print the path of one dataset file, downloading if needed.
    #[command(name = "path")]
    Path(PathArg),
    /// Show what is cached for one version.
    #[command(alias = "st", name = "status")]
    Status(StatusArg),
    /// List every cached version.
    #[command(alias = "ls", name = "list")]
    List,
    /// Re-hash cached files against their stored manifest.
    #[command(name = "verify")]
    Verify(StatusArg),
}

#[derive(Debug, Clone, Args)]
pub struct VersionArg {
    /// Release label, e.g. v0.3.1.
    #[arg(long)]
    pub version: Option<String>,
    /// Delete the cached version and download again.
    #[arg(long)]
    pub force:   bool,
}

#[derive(Debug, Clone, Args)]
pub struct PathArg {
    /// sex, place, bullet, sentinel, unified or prefecture_en.
    pub dataset: Dataset,
    #[command(flatten)]
    pub version: VersionArg,
}

#[derive(Debug, Clone, Args)]
pub struct StatusArg {
    #[arg(long)]
    pub version: Option<String>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "VERSION")]
    version:  String,
    #[tabled(rename = "COMPLETE")]
    complete: &'static str,
    #[tabled(rename = "DATASETS")]
    datasets: String,
    #[tabled(rename = "MISSING")]
    missing:  String,
    #[tabled(rename = "PATH")]
    path:     String,
}

impl From<&CacheStatus> for StatusRow {
    fn from(status: &CacheStatus) -> Self {
        Self {
            version:  status.version.to_string(),
            complete: if status.complete { "yes" } else { "no" },
            datasets: format!("{}/{}", status.present.len(), Dataset::ALL.len()),
            missing:  join(&status.missing),
            path:     status.dir.display().to_string(),
        }
    }
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "FILE")]
    file:   String,
    #[tabled(rename = "RESULT")]
    result: String,
}

fn join(datasets: &[Dataset]) -> String {
    if datasets.is_empty() {
        return "-".to_string();
    }
    datasets
        .iter()
        .copied()
        .map(Dataset::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Ok => "ok".to_string(),
        FileOutcome::Missing => "missing".to_string(),
        FileOutcome::ChecksumMismatch { expected, actual } => {
            format!("checksum mismatch (expected {expected}, got {actual})")
        }
        FileOutcome::SizeMismatch { expected, actual } => {
            format!("size mismatch (expected {expected}, got {actual})")
        }
    }
}

impl DataCommands {
    pub async fn run(self, cache: &Cache) -> anyhow::Result<()> {
        match self {
            DataCommands::Download(arg) => {
                let dir = cache.ensure_data(arg.version.as_deref(), arg.force).await?;
                println!("{}", dir.display());
            }
            DataCommands::Path(arg) => {
                let path = cache
                    .dataset_path(arg.dataset, arg.version.version.as_deref(), arg.version.force)
                    .await?;
                println!("{}", path.display());
            }
            DataCommands::Status(arg) => {
                let status = cache.status(arg.version.as_deref())?;
                println!("{}", Formatter::default().build([StatusRow::from(&status)]));
            }
            DataCommands::List => {
                let statuses = cache.list()?;
                if statuses.is_empty() {
                    println!("no cached versions under {}", cache.root().display());
                    return Ok(());
                }
                let rows = statuses.iter().map(StatusRow::from);
                println!("{}", Formatter::default().build(rows));
            }
            DataCommands::Verify(arg) => {
                let report = cache.verify(arg.version.as_deref())?;
                let rows = report.files.iter().map(|check| CheckRow {
                    file:   check.name.clone(),
                    result: describe(&check.outcome),
                });
                let header = format!("{} ({} manifest) at {}", report.version, report.manifest, report.dir.display());
                println!("{}", Formatter::default().header(header).build(rows));
                if !report.is_ok() {
                    anyhow::bail!("cached data for {} failed verification; run `idwr data download --force`", report.version);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_names_datasets() {
        assert_eq!(join(&[]), "-");
        assert_eq!(join(&[Dataset::ALL[0], Dataset::ALL[1]]), format!(
            "{}, {}",
            Dataset::ALL[0].name(),
            Dataset::ALL[1].name()
        ));
    }

    #[test]
    fn describe_outcomes() {
        assert_eq!(describe(&FileOutcome::Missing), "missing");
        assert_eq!(
            describe(&FileOutcome::SizeMismatch { expected: 2, actual: 1 }),
            "size mismatch (expected 2, got 1)"
        );
    }
}
