use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::{
    API_URL, DEFAULT_END_PAGE, DEFAULT_OUTPUT, DEFAULT_PAUSE_SECS, DEFAULT_START_PAGE,
    MAX_PAUSE_SECS, MIN_PAUSE_SECS,
};

#[derive(Parser, Debug)]
#[command(
    name = "rankscrape",
    about = "Collects data from usnews and generates an excel file"
)]
pub struct Cli {
    /// The usnews address to collect data from. Put the URL within quotes.
    #[arg(short, long)]
    pub url: String,
    /// The output file name without extension. The file is written as an .xlsx workbook.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,
    /// The pause time in seconds between loading pages. Clamped to 1..=10.
    #[arg(short, long, default_value_t = DEFAULT_PAUSE_SECS)]
    pub pause: u64,
    /// The page number from which the scraper starts working.
    #[arg(long = "from", default_value_t = DEFAULT_START_PAGE)]
    pub from: u32,
    /// The page number up to which the scraper works.
    #[arg(long = "to", default_value_t = DEFAULT_END_PAGE)]
    pub to: u32,
    /// Delete an existing output file of the same name before collecting.
    #[arg(long)]
    pub fresh: bool,
    /// Don't draw the progress bar.
    #[arg(short, long)]
    pub quiet: bool,
    /// Search api endpoint.
    #[arg(long, env = "RANKSCRAPE_API_URL", default_value = API_URL, hide = true)]
    pub api_url: String,
    /// Directory the spreadsheet (and the temporary page files) go into.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Everything a single run needs. Built once, never mutated after.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub url: String,
    pub output: String,
    pub pause: Duration,
    pub start_page: u32,
    pub end_page: u32,
    pub fresh: bool,
    pub quiet: bool,
    pub api_url: String,
    pub out_dir: PathBuf,
}

impl ScrapeConfig {
    /// Config with all the defaults for the given ranking page url.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output: DEFAULT_OUTPUT.to_string(),
            pause: clamp_pause(DEFAULT_PAUSE_SECS),
            start_page: DEFAULT_START_PAGE,
            end_page: DEFAULT_END_PAGE,
            fresh: false,
            quiet: false,
            api_url: API_URL.to_string(),
            out_dir: PathBuf::from("."),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_pause(mut self, secs: u64) -> Self {
        self.pause = clamp_pause(secs);
        self
    }

    /// Out of range bounds are clamped, never rejected.
    pub fn with_pages(mut self, from: u32, to: u32) -> Self {
        self.start_page = from.max(1);
        self.end_page = to.max(self.start_page);
        self
    }

    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }
}

impl From<Cli> for ScrapeConfig {
    fn from(cli: Cli) -> Self {
        ScrapeConfig::new(cli.url)
            .with_output(cli.output)
            .with_pause(cli.pause)
            .with_pages(cli.from, cli.to)
            .with_fresh(cli.fresh)
            .with_quiet(cli.quiet)
            .with_api_url(cli.api_url)
            .with_out_dir(cli.out_dir)
    }
}

#[inline]
fn clamp_pause(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_PAUSE_SECS, MAX_PAUSE_SECS))
}
