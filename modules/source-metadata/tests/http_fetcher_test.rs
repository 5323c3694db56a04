// HttpPageFetcher against a local axum server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use source_metadata::{
    CoalescePolicy, Favicon, HttpPageFetcher, MetadataCache, MetadataError, PageFetcher,
};

const USER_AGENT: &str = "source-metadata-test/1.0";

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn app() -> Router {
    Router::new()
        .route(
            "/",
            get(|| async {
                Html(r#"<html><head><title>Local Page</title><link rel="icon" href="/f.png"></head></html>"#)
            }),
        )
        .route("/bare", get(|| async { Html("<p>no head</p>") }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/whoami",
            get(|headers: HeaderMap| async move {
                let agent = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                Html(format!("<title>{agent}</title>"))
            }),
        )
}

fn fetcher() -> HttpPageFetcher {
    HttpPageFetcher::new(USER_AGENT, Duration::from_secs(5)).unwrap()
}

/// Address with nothing listening on it.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn fetches_page_body() {
    let addr = serve(app()).await;

    let html = fetcher().fetch(&format!("http://{addr}/")).await.unwrap();

    assert!(html.contains("<title>Local Page</title>"));
}

#[tokio::test]
async fn sends_client_identifier() {
    let addr = serve(app()).await;

    let html = fetcher().fetch(&format!("http://{addr}/whoami")).await.unwrap();

    assert!(html.contains(USER_AGENT), "server saw: {html}");
}

#[tokio::test]
async fn non_success_status_is_a_hard_error() {
    let addr = serve(app()).await;

    let err = fetcher()
        .fetch(&format!("http://{addr}/missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, MetadataError::Status { status: 404, .. }));
    assert!(!err.is_soft());
}

#[tokio::test]
async fn refused_connection_is_soft() {
    let addr = closed_addr().await;

    let err = fetcher().fetch(&format!("http://{addr}/")).await.unwrap_err();

    assert!(matches!(err, MetadataError::Transport(_)), "got {err:?}");
    assert!(err.is_soft());
}

#[tokio::test]
async fn cache_resolves_through_http() {
    let addr = serve(app()).await;
    let cache = MetadataCache::new(Arc::new(fetcher()), CoalescePolicy::EveryN(1));

    let page = cache.resolve(&format!("http://{addr}/")).await;
    assert_eq!(page.title.as_deref(), Some("Local Page"));
    assert_eq!(page.favicon, Some(Favicon::Url(format!("http://{addr}/f.png"))));

    let bare = cache.resolve(&format!("http://{addr}/bare")).await;
    assert_eq!(bare.title.as_deref(), Some("127.0.0.1"));
    assert_eq!(bare.favicon, Some(Favicon::Url(format!("http://{addr}/favicon.ico"))));

    let missing = cache.resolve(&format!("http://{addr}/missing")).await;
    assert!(missing.error);
    assert_eq!(missing.title.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn cache_degrades_when_host_is_unreachable() {
    let addr = closed_addr().await;
    let cache = MetadataCache::new(Arc::new(fetcher()), CoalescePolicy::EveryN(1));

    let entry = cache.resolve(&format!("http://{addr}/article")).await;

    assert!(!entry.error);
    assert!(entry.favicon.is_none());
    assert_eq!(entry.title.as_deref(), Some("127.0.0.1"));
}
