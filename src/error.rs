use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Sorry. Only Graduate School rankings from usnews are supported for now. Got: {0}")]
    UnsupportedUrl(String),

    #[error("An error occurred while processing the url: {url}\nStatus Code: {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("The response is missing a required field: {0}")]
    MissingField(&'static str),

    #[error("No records were collected, nothing to export.")]
    NoData,

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Spreadsheet Error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
