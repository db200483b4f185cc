//! HTTP surface: `GET /unzip/<archive>/<entry path>`.

pub mod body;
pub mod render;

use std::convert::Infallible;
use std::sync::Arc;

use log::{Level, debug, error, log, warn};
use percent_encoding::percent_decode_str;
use warp::http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, HeaderValue,
    PRAGMA,
};
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::path::Tail;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::error::UnzipError;
use crate::unzip::{DirectoryListing, FileContent, Outcome, Unzipper};

use render::{HtmlRenderer, JsonRenderer, ListingRenderer};

/// First path segment of every route
pub const MOUNT: &str = "unzip";

/// Build the routes serving `unzipper`'s root under `/unzip`
pub fn routes(
    unzipper: Arc<Unzipper>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let html = Arc::new(HtmlRenderer::new(&format!("/{MOUNT}")));

    warp::path(MOUNT)
        .and(warp::get())
        .and(warp::path::tail())
        .and(warp::header::optional::<String>("accept"))
        .and(warp::any().map(move || Arc::clone(&unzipper)))
        .and(warp::any().map(move || Arc::clone(&html)))
        .and_then(handle)
        .with(warp::log("zipserve::access"))
}

async fn handle(
    tail: Tail,
    accept: Option<String>,
    unzipper: Arc<Unzipper>,
    html: Arc<HtmlRenderer>,
) -> Result<Response, Infallible> {
    let response = match percent_decode_str(tail.as_str()).decode_utf8() {
        Ok(requested) => match unzipper.handle(&requested).await {
            Ok(Outcome::File(content)) => file_response(content),
            Ok(Outcome::Listing(listing)) => {
                if prefers_json(accept.as_deref()) {
                    listing_response(&JsonRenderer, &listing)
                } else {
                    listing_response(html.as_ref(), &listing)
                }
            }
            Err(err) => error_response(&err),
        },
        Err(_) => {
            debug!("Request path {:?} is not valid UTF-8", tail.as_str());
            status_response(StatusCode::NOT_FOUND)
        }
    };

    Ok(with_common_headers(response))
}

/// True when the first media range the client lists is JSON
fn prefers_json(accept: Option<&str>) -> bool {
    accept
        .and_then(|accept| accept.split(',').next())
        .and_then(|range| range.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}

fn file_response(content: FileContent) -> Response {
    let FileContent {
        reader,
        content_type,
        size,
        archive,
        entry_path,
    } = content;

    let mut response = Response::new(body::stream_entry(reader, archive));
    let headers = response.headers_mut();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    if let Some(content_type) = content_type {
        match HeaderValue::from_str(&content_type) {
            Ok(value) => {
                headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => warn!("Invalid media type {content_type:?} configured for {entry_path}"),
        }
    }
    response
}

fn listing_response(renderer: &dyn ListingRenderer, listing: &DirectoryListing) -> Response {
    match renderer.render(listing) {
        Ok(rendered) => {
            let mut response = Response::new(Body::from(rendered));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(renderer.content_type()),
            );
            response
        }
        Err(err) => {
            error!("Failed to render directory listing: {err:#}");
            status_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn error_response(err: &UnzipError) -> Response {
    if let Some(level) = log_level(err) {
        log!(level, "{err}");
    }
    status_response(err.status_code())
}

/// Level an error is logged at here, if it is not reported already
fn log_level(err: &UnzipError) -> Option<Level> {
    match err {
        // Warned about by the service when the entry was classified
        UnzipError::UnsupportedEntry { .. } => None,
        _ if err.status_code().is_server_error() => Some(Level::Error),
        _ => Some(Level::Debug),
    }
}

/// Response with a generic body; details stay in the log
fn status_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::from(status.canonical_reason().unwrap_or_default()));
    *response.status_mut() = status;
    response
}

fn with_common_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    response
}
