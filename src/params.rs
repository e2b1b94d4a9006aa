use std::collections::BTreeMap;

use tracing::{debug, warn};
use url::Url;

use crate::{DEFAULT_LABEL, SUPPORTED_PREFIX};

/// Query key the api expects the page number under.
pub const PAGE_KEY: &str = "_page";
pub const PROGRAM_KEY: &str = "program";
pub const SPECIALTY_KEY: &str = "specialty";

/// The query parameters derived from a ranking page url, plus the
/// human friendly label that names the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    params: BTreeMap<String, String>,
    label: String,
}

impl RequestParams {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn program(&self) -> Option<&str> {
        self.get(PROGRAM_KEY)
    }

    pub fn specialty(&self) -> Option<&str> {
        self.get(SPECIALTY_KEY)
    }

    /// The full query for a single page request.
    pub fn query(&self, page: u32) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(k, _)| k.as_str() != PAGE_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        query.push((PAGE_KEY.to_string(), page.to_string()));
        query
    }

    /// `_<value>_<value>..._<year>` with values in sorted key order.
    pub fn file_suffix(&self, year: Option<&str>) -> String {
        let mut suffix = String::new();
        for (key, value) in &self.params {
            if key == PAGE_KEY {
                continue;
            }
            suffix.push('_');
            suffix.push_str(value);
        }
        if let Some(year) = year {
            suffix.push('_');
            suffix.push_str(year);
        }
        suffix
    }
}

/// Only the graduate school rankings are backed by the search api.
pub fn is_supported(url: &str) -> bool {
    url.contains(SUPPORTED_PREFIX)
}

/// Recovers program and specialty from a ranking page url and copies over its query.
/// Never fails: whatever can't be recovered is simply left out.
pub fn extract(url: &str) -> RequestParams {
    let mut params = BTreeMap::new();
    let mut label = DEFAULT_LABEL.to_string();

    let Some(parsed) = parse_lenient(url) else {
        warn!("Couldn't parse url, using default parameters: {url}");
        return RequestParams { params, label };
    };

    // First segment is the site section (`best-graduate-schools`).
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.skip(1).collect())
        .unwrap_or_default();

    if let Some(program) = segments.first().filter(|p| !p.is_empty() && **p != "search") {
        params.insert(PROGRAM_KEY.to_string(), program.to_string());
        label = program.to_string();
    }

    if let Some(specialty) = segments.get(1).map(|s| strip_suffix(s)).filter(|s| !s.is_empty()) {
        params.insert(SPECIALTY_KEY.to_string(), specialty.to_string());
        label = specialty.to_string();
    }

    for (key, value) in parsed.query_pairs() {
        if value.is_empty() {
            continue;
        }
        params.insert(key.into_owned(), value.into_owned());
    }

    let label = display_label(&label);
    debug!(?params, %label, "extracted request parameters");
    RequestParams { params, label }
}

/// Accepts urls that were pasted without a scheme.
fn parse_lenient(url: &str) -> Option<Url> {
    let url = url.trim().trim_matches(|c| c == '"' || c == '\'');
    Url::parse(url)
        .or_else(|_| Url::parse(&format!("https://{url}")))
        .ok()
}

/// `computer-science-rankings` -> `computer-science`
#[inline]
fn strip_suffix(segment: &str) -> &str {
    match segment.rfind('-') {
        Some(idx) => &segment[..idx],
        None => segment,
    }
}

/// `computer-science` -> `Computer Science`
fn display_label(slug: &str) -> String {
    slug.replace('-', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CS_URL: &str =
        "https://www.usnews.com/best-graduate-schools/top-science-schools/computer-science-rankings";

    #[test]
    fn program_and_specialty_from_path() {
        let params = extract(CS_URL);
        assert_eq!(params.program(), Some("top-science-schools"));
        assert_eq!(params.specialty(), Some("computer-science"));
        assert_eq!(params.label(), "Computer Science");
    }

    #[test]
    fn query_params_are_copied_and_override() {
        let params = extract(
            "https://www.usnews.com/best-graduate-schools/top-medical-schools/research-rankings?state=CA&specialty=other&empty=",
        );
        assert_eq!(params.get("state"), Some("CA"));
        assert_eq!(params.specialty(), Some("other"));
        assert_eq!(params.get("empty"), None);
        // Label comes from the path, not the query.
        assert_eq!(params.label(), "Research");
    }

    #[test]
    fn program_only_url() {
        let params = extract("https://www.usnews.com/best-graduate-schools/top-law-schools");
        assert_eq!(params.program(), Some("top-law-schools"));
        assert_eq!(params.specialty(), None);
        assert_eq!(params.label(), "Top Law Schools");
    }

    #[test]
    fn search_is_not_a_program() {
        let params =
            extract("https://www.usnews.com/best-graduate-schools/search?program=top-nursing-schools");
        assert_eq!(params.program(), Some("top-nursing-schools"));
        assert_eq!(params.label(), DEFAULT_LABEL);
    }

    #[test]
    fn shallow_or_broken_urls_keep_defaults() {
        for url in ["https://www.usnews.com/best-graduate-schools", "::::", ""] {
            let params = extract(url);
            assert_eq!(params.program(), None, "{url}");
            assert_eq!(params.specialty(), None, "{url}");
            assert_eq!(params.label(), DEFAULT_LABEL, "{url}");
        }
    }

    #[test]
    fn scheme_less_urls_are_accepted() {
        let params = extract(
            "'www.usnews.com/best-graduate-schools/top-science-schools/computer-science-rankings'",
        );
        assert_eq!(params.specialty(), Some("computer-science"));
    }

    #[test]
    fn page_is_injected_into_query() {
        let query = extract(CS_URL).query(3);
        assert_eq!(
            query,
            vec![
                ("program".to_string(), "top-science-schools".to_string()),
                ("specialty".to_string(), "computer-science".to_string()),
                ("_page".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn suffix_uses_sorted_values_and_year() {
        let params = extract(&format!("{CS_URL}?area=west"));
        assert_eq!(
            params.file_suffix(Some("2024")),
            "_west_top-science-schools_computer-science_2024"
        );
        assert_eq!(
            params.file_suffix(None),
            "_west_top-science-schools_computer-science"
        );
    }

    #[test]
    fn supported_urls() {
        assert!(is_supported(CS_URL));
        assert!(!is_supported("https://www.usnews.com/best-colleges"));
    }
}
