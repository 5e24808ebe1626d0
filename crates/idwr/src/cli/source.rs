use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use idwr_data::sources::{ConfirmedKind, Lang, confirmed_url, probe_bullet_urls};
use idwr_fetch::HttpCache;
use tracing::warn;

use super::Cache;

const HTTP_CACHE_DIR: &str = "http";

#[derive(Debug, Subcommand)]
pub enum SourceCommands {
    /// URL of the annual confirmed-case workbook.
    #[command(name = "confirmed")]
    Confirmed(ConfirmedArg),
    /// Weekly bulletin CSVs that are currently published.
    #[command(name = "bullet")]
    Bullet(BulletArg),
}

#[derive(Debug, Clone, Args)]
pub struct ConfirmedArg {
    #[arg(long)]
    pub year: u16,
    /// sex or place.
    #[arg(long, default_value = "sex")]
    pub kind: ConfirmedKind,
    /// Download into this directory instead of printing the URL.
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct BulletArg {
    #[arg(long)]
    pub year: u16,
    /// Repeatable; all weeks when omitted.
    #[arg(long = "week", value_name = "WEEK")]
    pub weeks: Vec<u8>,
    /// en or ja.
    #[arg(long, default_value = "en")]
    pub lang: Lang,
    /// Download the available files into this directory.
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

impl SourceCommands {
    pub async fn run(self, cache: &Cache) -> anyhow::Result<()> {
        match self {
            SourceCommands::Confirmed(arg) => {
                let url = confirmed_url(arg.year, arg.kind)?;
                match arg.dest {
                    Some(dest) => download(cache, &[url], dest).await?,
                    None => println!("{url}"),
                }
            }
            SourceCommands::Bullet(arg) => {
                let weeks = (!arg.weeks.is_empty()).then_some(arg.weeks.as_slice());
                let availability = probe_bullet_urls(cache.fetcher(), arg.year, weeks, arg.lang).await?;
                for (url, err) in &availability.failed {
                    warn!("could not check {url}: {err}");
                }
                match arg.dest {
                    Some(dest) => download(cache, &availability.available, dest).await?,
                    None => availability.available.iter().for_each(|url| println!("{url}")),
                }
                if !availability.failed.is_empty() {
                    anyhow::bail!("{} bulletin URL(s) could not be checked", availability.failed.len());
                }
            }
        }
        Ok(())
    }
}

/// Rate-limited, ETag-revalidated download of `urls` into `dest`.
async fn download(cache: &Cache, urls: &[String], dest: PathBuf) -> anyhow::Result<()> {
    let http = HttpCache::new(cache.root().join(HTTP_CACHE_DIR))?;
    let limiter = cache.settings().rate_limiter();
    let placed = cache
        .fetcher()
        .download_all(&http, &limiter, urls, &dest)
        .await
        .with_context(|| format!("downloading into {}", dest.display()))?;
    for path in placed {
        println!("{}", path.display());
    }
    Ok(())
}
