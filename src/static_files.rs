use axum::body::Body;
use axum::http::{header, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use mime_guess::from_path;
use rust_embed::RustEmbed;

use crate::error::AppError;

const INDEX: &str = "index.html";

#[derive(RustEmbed)]
#[folder = "ui/dist"]
struct WebAssets;

/// Serves the embedded front-end; unknown non-api paths fall back to the index page.
pub async fn serve_embedded_asset(uri: Uri) -> Response {
    let requested = uri.path().trim_start_matches('/');

    if requested == "api" || requested.starts_with("api/") {
        return AppError::NotFound(format!("no route for /{requested}")).into_response();
    }

    let asset_path = if requested.is_empty() { INDEX } else { requested };

    asset_response(asset_path)
        .or_else(|| asset_response(INDEX))
        .unwrap_or_else(|| {
            AppError::NotFound("front-end bundle is missing".to_string()).into_response()
        })
}

fn asset_response(path: &str) -> Option<Response> {
    let content = WebAssets::get(path)?;

    let mime = from_path(path).first_or_octet_stream();
    let mut response = Response::new(Body::from(content.data.into_owned()));
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }

    let cache_control = if path == INDEX {
        "no-cache"
    } else {
        "public, max-age=3600"
    };
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    Some(response)
}
