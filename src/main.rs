use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use url::Url;

mod config;
mod extract;
mod images;
mod models;
mod resolve;
mod text;
mod tokens;
mod words;

use config::Config;
use models::{PageInfoQuery, PageResult};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let client = config.http_client()?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(client)).await?;
    Ok(())
}

fn app(client: reqwest::Client) -> Router {
    Router::new()
        .route("/api/pageinfo", get(page_info_endpoint))
        .with_state(client)
}

async fn page_info_endpoint(
    State(client): State<reqwest::Client>,
    Query(query): Query<PageInfoQuery>,
) -> (StatusCode, Json<PageResult>) {
    let url = match validate_url(query.url.as_deref()) {
        Ok(url) => url,
        Err(msg) => {
            tracing::debug!("rejected page info request: {}", msg);
            return (StatusCode::BAD_REQUEST, Json(PageResult::failed(msg)));
        }
    };

    tracing::info!("page info for {}", url);
    let result = extract::get_page_info(&client, url.as_str()).await;
    let status = if result.is_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, Json(result))
}

// ── URL validation ───────────────────────────────────────────────────────────

fn validate_url(raw: Option<&str>) -> Result<Url, String> {
    match raw {
        None => Err("URL was not provided.".to_string()),
        Some("") => Err("URL query is empty.".to_string()),
        Some(raw) => Url::parse(raw).map_err(|e| e.to_string()),
    }
}
