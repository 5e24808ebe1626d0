use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use idwr_data::{DataCache, Settings};
use idwr_fetch::ReqwestClient;

pub mod data;
pub mod source;

#[derive(Debug, Parser)]
#[command(name = "idwr", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
/// Japanese infectious disease surveillance data, cached and verified.
pub struct App {
    /// TOML settings file; `JPINFECT_*` environment variables override it.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More diagnostics on stderr (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the local release data cache.
    #[command(subcommand, name = "data")]
    Data(data::DataCommands),
    /// Locate the upstream files the datasets are built from.
    #[command(subcommand, name = "source", alias = "src")]
    Source(source::SourceCommands),
}

impl App {
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        let cache = DataCache::from_settings(settings)?;
        match self.cmd {
            Commands::Data(cmd) => cmd.run(&cache).await,
            Commands::Source(cmd) => cmd.run(&cache).await,
        }
    }
}

pub type Cache = DataCache<ReqwestClient>;

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use idwr_data::Dataset;
    use idwr_data::sources::Lang;

    use super::*;

    #[test]
    fn test_command_is_well_formed() { App::command().debug_assert(); }

    #[test]
    fn test_parse_data_path_with_alias() {
        let app = App::try_parse_from(["idwr", "-v", "data", "path", "sex", "--version", "v0.3.1", "--force"]).unwrap();
        assert_eq!(app.verbose, 1);
        let Commands::Data(data::DataCommands::Path(arg)) = app.cmd else {
            panic!("expected data path");
        };
        assert_eq!(arg.dataset, Dataset::SexPrefecture);
        assert_eq!(arg.version.version.as_deref(), Some("v0.3.1"));
        assert!(arg.version.force);
    }

    #[test]
    fn test_parse_bullet_weeks() {
        let app = App::try_parse_from(["idwr", "source", "bullet", "--year", "2025", "--week", "3", "--week", "12", "--lang", "ja"])
            .unwrap();
        let Commands::Source(source::SourceCommands::Bullet(arg)) = app.cmd else {
            panic!("expected source bullet");
        };
        assert_eq!(arg.weeks, vec![3, 12]);
        assert_eq!(arg.lang, Lang::Ja);
    }

    #[test]
    fn test_unknown_dataset_is_rejected() {
        assert!(App::try_parse_from(["idwr", "data", "path", "weekly"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let app = App::try_parse_from(["idwr", "data", "list", "--config", "idwr.toml"]).unwrap();
        assert_eq!(app.config, Some(PathBuf::from("idwr.toml")));
    }
}
