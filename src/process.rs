use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use crate::config::ScrapeConfig;
use crate::dataset::assemble;
use crate::export::{export, output_path};
use crate::pages::{clamp_bounds, PageStore};
use crate::params::{self, RequestParams};
use crate::request::{build_client, discover, request_page};
use crate::{info_time, Error, Result, DISCOVERY_PAUSE_SECS, USER_AGENT};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Absolute path of the written spreadsheet.
    pub output: PathBuf,
    pub first_page: u32,
    pub last_page: u32,
    pub primary_rows: usize,
    pub locked_rows: usize,
}

impl Summary {
    pub fn pages(&self) -> u32 {
        self.last_page - self.first_page + 1
    }

    pub fn rows(&self) -> usize {
        self.primary_rows + self.locked_rows
    }
}

/// Collects the ranking behind `config.url` and writes it to a spreadsheet.
/// The temporary page files are gone once this returns, successful or not.
pub async fn run(config: &ScrapeConfig) -> Result<Summary> {
    let start_time = Local::now();

    if !params::is_supported(&config.url) {
        return Err(Error::UnsupportedUrl(config.url.clone()));
    }
    let params = params::extract(&config.url);
    let client = build_client(USER_AGENT)?;

    // The first page tells us how many there are.
    let first = request_page(&client, &config.api_url, &params, 1).await?;
    let info = discover(&first)?;
    if info.total_pages == 0 {
        return Err(Error::NoData);
    }
    let (first_page, last_page) =
        clamp_bounds(info.total_pages, config.start_page, config.end_page);

    info_time!(
        "Collecting data from \"{}\" from page {} to page {} with pause time of {} sec.",
        config.url,
        first_page,
        last_page,
        config.pause.as_secs()
    );

    fs::create_dir_all(&config.out_dir).await?;
    let output = output_path(
        &config.out_dir,
        &config.output,
        &params,
        info.year.as_deref(),
    );
    if config.fresh {
        remove_previous_output(&output).await?;
    }

    let store = PageStore::create_in(&config.out_dir)?;
    tokio::time::sleep(std::time::Duration::from_secs(DISCOVERY_PAUSE_SECS)).await;

    fetch_pages(
        &client,
        config,
        &params,
        &store,
        first_page..=last_page,
        Some(first),
    )
    .await?;

    let pages = store.load_all().await?;
    let (dataset, counts) = assemble(params.label(), &pages);
    info!(
        primary = counts.primary,
        locked = counts.locked,
        "Assembled {} rows from {} pages",
        dataset.len(),
        pages.len()
    );

    export(&dataset, &output)?;
    store.close()?;

    let output = fs::canonicalize(&output).await?;
    info_time!(start_time, "Finished: {}", output.display());

    Ok(Summary {
        output,
        first_page,
        last_page,
        primary_rows: counts.primary,
        locked_rows: counts.locked,
    })
}

/// Requests every page in `pages` one after the other and saves each one before
/// moving on. `first` is the already fetched first page of the ranking, if any.
/// Stops at the first failed request.
pub async fn fetch_pages(
    client: &Client,
    config: &ScrapeConfig,
    params: &RequestParams,
    store: &PageStore,
    pages: std::ops::RangeInclusive<u32>,
    mut first: Option<Value>,
) -> Result<usize> {
    let pb = progress_bar(pages.clone().count() as u64, config.quiet);
    let last = *pages.end();
    let mut saved = 0;

    for page in pages {
        let json = match first.take() {
            Some(json) if page == 1 => json,
            _ => request_page(client, &config.api_url, params, page).await?,
        };
        let path = store.save(page, &json).await?;
        debug!("Saved page {page} to {}", path.display());
        saved += 1;
        pb.inc(1);

        if page != last {
            tokio::time::sleep(config.pause).await;
        }
    }

    pb.finish_and_clear();
    Ok(saved)
}

fn progress_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} pages (eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

async fn remove_previous_output(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed previous output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
