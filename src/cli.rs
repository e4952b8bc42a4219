use crate::{
    cocktaildb::{self, DEFAULT_BASE_URL, MeasurePolicy},
    scrape,
};
use anyhow::{Error, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::log::LevelFilter;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::{io, time::Duration};
use tracing_subscriber::filter::LevelFilter as TFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Default, ValueEnum)]
pub enum LogFormat {
    Normal,
    Compact,
    Pretty,
    #[default]
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Log level verbosity
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Which log formatter to use
    // read from LOG_FORMAT when not given on the command line
    #[arg(short = 'f', long, env, default_value_t, value_enum)]
    pub log_format: LogFormat,

    /// Postgres connection URL
    #[arg(long, env, hide_env_values = true)]
    pub database_url: String,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Fetch drinks from TheCocktailDB and store them as recipes
    Scrape(ScrapeArgs),
    /// Add random reviews to all stored recipes
    Review {
        /// Seed for the random generator, for repeatable runs
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Print a recipe and its reviews, for manual inspection
    Sample {
        /// Recipe name
        #[arg(short, long, default_value = "Negroni Sbagliato")]
        name: String,
    },
    /// Print canned listings of the stored recipes
    Report {
        /// List recipes containing this ingredient
        #[arg(short, long, default_value = "Vodka")]
        ingredient: String,

        /// How many of the highest rated recipes to list
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// Number of random drinks to fetch
    #[arg(short = 'n', long, default_value_t = 100)]
    pub count: usize,

    /// Fetch these drink IDs instead of random drinks
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Pause between requests
    #[arg(short, long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub delay: Duration,

    /// Max random extra pause between requests
    #[arg(short, long, default_value = "0s", value_parser = humantime::parse_duration)]
    pub jitter: Duration,

    /// Base URL of the drink API
    #[arg(long, env, default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Timeout for each request
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub request_timeout: Duration,

    /// What to do with a drink that has an ingredient measurement that can't be parsed
    #[arg(long, default_value_t, value_enum)]
    pub on_bad_measure: MeasurePolicy,
}

impl ScrapeArgs {
    pub fn client_opts(&self) -> cocktaildb::Opts {
        cocktaildb::Opts {
            base_url: self.api_url.clone(),
            request_timeout: self.request_timeout,
        }
    }

    pub fn scrape_opts(&self) -> scrape::Opts {
        scrape::Opts {
            count: self.count,
            ids: self.ids.clone(),
            delay: self.delay,
            jitter: self.jitter,
            policy: self.on_bad_measure,
        }
    }
}

impl Cli {
    /// Parse from an explicit argument list, returning clap's usage errors instead of exiting
    pub fn try_parse_opts<I, T>(itr: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(itr).map_err(Error::from)
    }

    /// Parse the process arguments, exiting with usage on error
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log level from the -v/-q flags, used when RUST_LOG doesn't say otherwise
    fn tracing_level_filter(&self) -> TFilter {
        match self.verbosity.log_level_filter() {
            LevelFilter::Off => TFilter::OFF,
            LevelFilter::Error => TFilter::ERROR,
            LevelFilter::Warn => TFilter::WARN,
            LevelFilter::Info => TFilter::INFO,
            LevelFilter::Debug => TFilter::DEBUG,
            LevelFilter::Trace => TFilter::TRACE,
        }
    }

    /// Install the global subscriber. Logs go to stderr so command output on stdout stays clean.
    pub fn init_logger(&self) -> Result<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(self.tracing_level_filter().into())
            .from_env()?;
        let layer = match self.log_format {
            LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
            LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).boxed(),
            LogFormat::Compact => fmt::layer()
                .without_time()
                .compact()
                .with_writer(io::stderr)
                .boxed(),
            LogFormat::Normal => fmt::layer().with_writer(io::stderr).boxed(),
        };
        tracing_subscriber::registry().with(filter).with(layer).init();
        Ok(())
    }
}
