use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::params::RequestParams;
use crate::{info_time, Error, Result};

/// What the first response tells us about the whole ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub total_pages: u32,
    pub year: Option<String>,
}

/// Every request goes out with the given user agent.
pub fn build_client(user_agent: &str) -> Result<Client> {
    let client = Client::builder().user_agent(user_agent).build()?;
    Ok(client)
}

/// Requests a single page and returns its JSON body.
/// Anything other than a success status is an error naming the full request url.
pub async fn request_page(
    client: &Client,
    api_url: &str,
    params: &RequestParams,
    page: u32,
) -> Result<Value> {
    let res = client
        .get(api_url)
        .query(&params.query(page))
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: res.url().to_string(),
            status,
        });
    }
    debug!("Got page {page} from {}", res.url());

    let json = res.json::<Value>().await?;
    Ok(json)
}

/// Reads the page count and ranking year out of a response.
pub fn discover(json: &Value) -> Result<PageInfo> {
    let data = json.get("data");
    let total_pages = data
        .and_then(|d| d.get("totalPages"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(Error::MissingField("data.totalPages"))?;

    let year = data
        .and_then(|d| d.get("hero"))
        .and_then(|h| h.get("year"))
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    info_time!("Api reports {total_pages} pages, year {year:?}");
    Ok(PageInfo { total_pages, year })
}
