use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rankscrape::{config::ScrapeConfig, process::run, Error};
use serde_json::{json, Value};
use tempfile::TempDir;

const CS_URL: &str =
    "https://www.usnews.com/best-graduate-schools/top-science-schools/computer-science-rankings";

/// Stand-in for the search api. Serves `pages[n - 1]` for `_page=n`.
#[derive(Default)]
struct MockApi {
    pages: Vec<Value>,
    fail_on: Option<u32>,
    hits: Mutex<Vec<(u32, Option<String>)>>,
    hit_times: Mutex<Vec<Instant>>,
}

impl MockApi {
    fn pages_requested(&self) -> Vec<u32> {
        self.hits.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }

    fn gaps(&self) -> Vec<Duration> {
        self.hit_times
            .lock()
            .unwrap()
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect()
    }
}

async fn search(
    State(api): State<Arc<MockApi>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let page: u32 = query
        .get("_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    let agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    api.hits.lock().unwrap().push((page, agent));
    api.hit_times.lock().unwrap().push(Instant::now());

    if query.get("program").map(String::as_str) != Some("top-science-schools") {
        return (StatusCode::BAD_REQUEST, "missing program").into_response();
    }
    if api.fail_on == Some(page) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    match page.checked_sub(1).and_then(|i| api.pages.get(i as usize)) {
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve(api: MockApi) -> (SocketAddr, Arc<MockApi>) {
    let api = Arc::new(api);
    let app = Router::new()
        .route("/api/search", get(search))
        .with_state(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, api)
}

fn page(total: u32, items: Vec<Value>, locked: Option<Vec<Value>>) -> Value {
    json!({
        "data": {
            "totalPages": total,
            "hero": { "year": 2024 },
            "items": items,
            "itemsLocked": locked,
        }
    })
}

fn school(name: &str, rank: u32) -> Value {
    json!({
        "name": name,
        "state": "MA",
        "city": "Cambridge",
        "ranking": { "display_rank": rank.to_string(), "is_tied": false },
        "schoolData": { "c_avg_acad_rep_score": "4.8" },
        "url": format!("https://www.usnews.com/best-graduate-schools/{name}"),
    })
}

fn config(addr: SocketAddr, out_dir: &Path) -> ScrapeConfig {
    ScrapeConfig::new(CS_URL)
        .with_api_url(format!("http://{addr}/api/search"))
        .with_out_dir(out_dir)
        .with_pause(1)
        .with_quiet(true)
}

fn leftover_work_dirs(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".rankscrape-"))
        .count()
}

#[tokio::test]
async fn collects_all_pages_into_one_spreadsheet() {
    let (addr, api) = serve(MockApi {
        pages: vec![
            page(2, vec![school("mit", 1), school("stanford", 2)], Some(vec![school("locked-a", 9)])),
            page(2, vec![school("cmu", 3)], Some(vec![school("locked-b", 10)])),
        ],
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();

    let summary = run(&config(addr, out.path()).with_pages(1, 100)).await.unwrap();

    assert_eq!((summary.first_page, summary.last_page), (1, 2));
    assert_eq!(summary.primary_rows, 3);
    assert_eq!(summary.locked_rows, 2);
    assert!(summary.output.is_absolute());
    assert_eq!(
        summary.output.file_name().unwrap(),
        "usnews_top-science-schools_computer-science_2024.xlsx"
    );
    assert!(summary.output.exists());
    assert_eq!(leftover_work_dirs(out.path()), 0);

    // Page 1 doubles as the discovery request.
    assert_eq!(api.pages_requested(), vec![1, 2]);
    let hits = api.hits.lock().unwrap();
    assert!(hits
        .iter()
        .all(|(_, agent)| agent.as_deref() == Some(rankscrape::USER_AGENT)));
}

#[tokio::test]
async fn start_past_the_last_page_fetches_only_the_last_page() {
    let (addr, api) = serve(MockApi {
        pages: vec![
            page(2, vec![school("mit", 1)], None),
            page(2, vec![school("cmu", 3)], None),
        ],
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();

    let summary = run(&config(addr, out.path()).with_pages(5, 9)).await.unwrap();

    assert_eq!((summary.first_page, summary.last_page), (2, 2));
    assert_eq!(summary.rows(), 1);
    assert_eq!(api.pages_requested(), vec![1, 2]);
}

#[tokio::test]
async fn http_failure_aborts_the_run_and_cleans_up() {
    let (addr, api) = serve(MockApi {
        pages: vec![
            page(3, vec![school("mit", 1)], None),
            page(3, vec![school("cmu", 3)], None),
            page(3, vec![school("yale", 4)], None),
        ],
        fail_on: Some(2),
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();

    let err = run(&config(addr, out.path())).await.unwrap_err();

    match err {
        Error::HttpStatus { url, status } => {
            assert_eq!(status.as_u16(), 500);
            assert!(url.contains("_page=2"), "{url}");
        }
        other => panic!("expected an http error, got {other:?}"),
    }
    // No retries and nothing after the failed page.
    assert_eq!(api.pages_requested(), vec![1, 2]);
    assert_eq!(leftover_work_dirs(out.path()), 0);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn no_records_is_fatal_and_nothing_is_exported() {
    let (addr, _api) = serve(MockApi {
        pages: vec![page(1, vec![], None)],
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();

    let err = run(&config(addr, out.path())).await.unwrap_err();

    assert!(matches!(err, Error::NoData));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn fresh_run_removes_previous_output() {
    let (addr, _api) = serve(MockApi {
        pages: vec![page(1, vec![], None)],
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();
    let previous = out
        .path()
        .join("usnews_top-science-schools_computer-science_2024.xlsx");
    std::fs::write(&previous, b"stale").unwrap();

    let err = run(&config(addr, out.path()).with_fresh(true))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoData));
    assert!(!previous.exists());
}

#[tokio::test]
async fn ranking_without_pages_is_fatal_after_one_request() {
    let (addr, api) = serve(MockApi {
        pages: vec![page(0, vec![], None)],
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();

    let err = run(&config(addr, out.path())).await.unwrap_err();

    assert!(matches!(err, Error::NoData), "{err:?}");
    assert_eq!(api.pages_requested(), vec![1]);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn pages_are_requested_with_the_configured_pause_between_them() {
    let (addr, api) = serve(MockApi {
        pages: vec![
            page(3, vec![school("mit", 1)], None),
            page(3, vec![school("cmu", 2)], None),
            page(3, vec![school("yale", 3)], None),
        ],
        ..Default::default()
    })
    .await;
    let out = TempDir::new().unwrap();
    let config = config(addr, out.path()).with_pause(1);

    run(&config).await.unwrap();

    assert_eq!(api.pages_requested(), vec![1, 2, 3]);
    let gaps = api.gaps();
    assert_eq!(gaps.len(), 2);
    // Discovery pause plus the page pause before page 2, just the page pause before page 3.
    assert!(gaps[0] >= config.pause + Duration::from_secs(1), "{gaps:?}");
    assert!(gaps[1] >= config.pause, "{gaps:?}");
}
