use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};

use crate::Result;

const PAGE_FILE_EXT: &str = "json";
const WORK_DIR_PREFIX: &str = ".rankscrape-";

/// Caps the requested range to what the api actually has.
/// If the range ends up inverted both bounds collapse onto the last valid page.
/// Never goes below page 1, even when the api reports no pages at all.
pub fn clamp_bounds(total_pages: u32, start: u32, end: u32) -> (u32, u32) {
    let end = end.max(1).min(total_pages.max(1));
    let start = start.max(1);
    if start > end {
        (end, end)
    } else {
        (start, end)
    }
}

/// One saved page read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFile {
    pub page: u32,
    pub items: Vec<Value>,
    /// Paywalled entries, listed separately by the api.
    pub locked: Option<Vec<Value>>,
}

impl PageFile {
    pub fn from_json(page: u32, json: &Value) -> Self {
        let data = json.get("data");
        let items = data
            .and_then(|d| d.get("items"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_else(|| {
                warn!("Page {page} has no items");
                Vec::new()
            });
        let locked = data
            .and_then(|d| d.get("itemsLocked"))
            .and_then(Value::as_array)
            .cloned();
        PageFile {
            page,
            items,
            locked,
        }
    }
}

/// Holds the raw page responses for the duration of one run.
/// The directory goes away when the store is dropped, whichever way the run ends.
#[derive(Debug)]
pub struct PageStore {
    dir: TempDir,
}

impl PageStore {
    pub fn create_in(parent: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(parent)?;
        debug!("Created work dir {}", dir.path().display());
        Ok(PageStore { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn page_path(&self, page: u32) -> PathBuf {
        self.dir
            .path()
            .join(format!("{page:03}.{PAGE_FILE_EXT}"))
    }

    /// Writes the response verbatim.
    pub async fn save(&self, page: u32, json: &Value) -> Result<PathBuf> {
        let path = self.page_path(page);
        let mut file = File::create(&path).await?;
        file.write_all(&serde_json::to_vec(json)?).await?;
        file.flush().await?;
        Ok(path)
    }

    /// Reads every saved page back, in ascending page order.
    pub async fn load_all(&self) -> Result<Vec<PageFile>> {
        let mut numbered = Vec::new();
        let mut entries = fs::read_dir(self.dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            match page_number(&path) {
                Some(page) => numbered.push((page, path)),
                None => debug!("Skipping {}", path.display()),
            }
        }
        numbered.sort_unstable_by_key(|(page, _)| *page);

        let mut pages = Vec::with_capacity(numbered.len());
        for (page, path) in numbered {
            let json: Value = serde_json::from_slice(&fs::read(path).await?)?;
            pages.push(PageFile::from_json(page, &json));
        }
        Ok(pages)
    }

    /// Removes the work dir now and reports any failure.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

#[inline]
fn page_number(path: &Path) -> Option<u32> {
    if path.extension()? != PAGE_FILE_EXT {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
