use serde_json::Value;

use crate::pages::PageFile;
use crate::record::{Cell, Record, COLUMN_COUNT, HEADERS};

pub type Row = [Cell; COLUMN_COUNT];

/// In-memory table of every collected record. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    title: String,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(title: impl Into<String>) -> Self {
        Dataset {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn headers(&self) -> &'static [&'static str; COLUMN_COUNT] {
        &HEADERS
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flattens and appends the given raw records, returns how many were added.
    pub fn append<'a>(&mut self, records: impl IntoIterator<Item = &'a Value>) -> usize {
        let before = self.rows.len();
        self.rows
            .extend(records.into_iter().map(|json| Record::from_json(json).row()));
        self.rows.len() - before
    }
}

/// Row counts for the two halves of an assembled dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleCounts {
    pub primary: usize,
    pub locked: usize,
}

/// All primary records page by page, then every page's locked records
/// in the order the pages were read.
pub fn assemble(title: impl Into<String>, pages: &[PageFile]) -> (Dataset, AssembleCounts) {
    let mut dataset = Dataset::new(title);
    let mut counts = AssembleCounts::default();

    for page in pages {
        counts.primary += dataset.append(&page.items);
    }
    for locked in pages.iter().filter_map(|p| p.locked.as_ref()) {
        counts.locked += dataset.append(locked);
    }

    (dataset, counts)
}
