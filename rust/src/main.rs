use crate::{download::Download, harvest::Harvest, options::mapping_options};
use color_eyre::eyre::{eyre, Result};
use std::path::PathBuf;
use time::{macros::format_description, Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;
use wealthsimple_mapping::{LedgerLookup, LedgerSnapshot, Mapper};

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Comma-separated overrides of metadata keys, payee and tolerance, each of the form `name=value`
    #[clap(short, value_delimiter = ',')]
    options: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the tagging of the ledger snapshot, reporting every issue found
    Check {
        /// Ledger snapshot JSON file path
        snapshot: PathBuf,

        /// Wealthsimple download JSON file path, to check every account has a tagged cash account
        download: Option<PathBuf>,
    },

    /// Map a Wealthsimple download onto directives missing from the ledger
    Harvest {
        /// Ledger snapshot JSON file path
        snapshot: PathBuf,

        /// Wealthsimple download JSON file path
        download: PathBuf,

        /// Date of the zero balance for accounts without positions, default today
        #[clap(long, value_parser = parse_date)]
        as_of: Option<Date>,

        #[clap(long, value_enum, default_value_t)]
        format: Format,
    },
}

#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub(crate) enum Format {
    #[default]
    Beancount,
    Json,
}

fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
}

fn main() -> Result<()> {
    let out_w = &std::io::stdout();
    let error_w = &std::io::stderr();

    color_eyre::install()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let options = mapping_options(&cli.options)?;

    match &cli.command {
        Command::Check { snapshot, download } => {
            let snapshot = json::read::<LedgerSnapshot>(snapshot)?;
            let lookup = LedgerLookup::new(&snapshot, &options)?;

            if let Some(download) = download {
                let download = Download::load_from(download)?;
                let missing = lookup.missing_cash_accounts(&download.accounts);
                if !missing.is_empty() {
                    let report = missing
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n  ");
                    return Err(eyre!("{} account(s) untagged\n  {report}", missing.len()));
                }
            }

            Ok(())
        }

        Command::Harvest {
            snapshot,
            download,
            as_of,
            format,
        } => {
            let snapshot = json::read::<LedgerSnapshot>(snapshot)?;
            let lookup = LedgerLookup::new(&snapshot, &options)?;
            // the snapshot is not needed once indexed
            drop(snapshot);

            let download = Download::load_from(download)?;
            let mapper = Mapper::new(&lookup, download.accounts.clone());
            let as_of = as_of.unwrap_or_else(|| OffsetDateTime::now_utc().date());

            let harvest = Harvest::collect(&mapper, &download, as_of);

            match format {
                Format::Beancount => harvest.write_as_beancount(out_w)?,
                Format::Json => harvest.write_as_json(out_w)?,
            }

            if harvest.failures.is_empty() {
                Ok(())
            } else {
                harvest.write_failures(error_w)?;
                Err(eyre!("{} account(s) failed", harvest.failures.len()))
            }
        }
    }
}

pub(crate) mod download;
pub(crate) mod harvest;
pub(crate) mod json;
pub(crate) mod options;
