use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use shortform::{
    ClientError, HttpShortener, OptionPanel, ResultDisplay, Shortener, ShortenRequest, SubmissionController, Ttl,
    model::Style, render::Rendered,
};
use warp::Filter;

fn free_addr() -> Result<SocketAddr, std::io::Error> {
    std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()
}

async fn wait_ready(addr: SocketAddr) {
    for _ in 0..200 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn shortener(addr: SocketAddr) -> Result<HttpShortener, Box<dyn std::error::Error + 'static>> {
    let endpoint = url::Url::parse(&format!("http://{}/", addr))?;
    let http = reqwest::Client::builder().no_proxy().build()?;
    Ok(HttpShortener::with_client(endpoint, http))
}

/// Starts a stub endpoint that answers every POST with a fixed short URL and records the raw query.
async fn stub_endpoint() -> Result<(SocketAddr, Arc<Mutex<Vec<String>>>), Box<dyn std::error::Error + 'static>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let shorten = warp::post()
        .and(warp::path::end())
        .and(warp::query::raw())
        .map(move |query: String| {
            record.lock().unwrap().push(query);
            "https://s.example/abc"
        });
    let history = warp::get().and(warp::path("history")).and(warp::path::end()).map(|| {
        warp::reply::json(&serde_json::json!({
            "note": "links created from your address",
            "ip": "127.0.0.1",
            "links": [{
                "id": 1,
                "origin": "https://example.com",
                "alias": "abcde",
                "ip": "127.0.0.1",
                "ctime": "2024-05-01T10:00:00Z",
                "mtime": "2024-05-01T10:00:00Z",
                "expired": false,
                "ttl": 86400000000000i64
            }]
        }))
    });

    let addr = free_addr()?;
    tokio::spawn(warp::serve(shorten.or(history)).run(addr));
    wait_ready(addr).await;
    Ok((addr, seen))
}

#[derive(Clone, Default)]
struct RecordingDisplay {
    shown: Arc<Mutex<Vec<Rendered>>>,
}

impl ResultDisplay for RecordingDisplay {
    fn show(&self, rendered: Rendered) {
        self.shown.lock().unwrap().push(rendered);
    }
}

impl RecordingDisplay {
    async fn wait_settled(&self) -> Option<Rendered> {
        for _ in 0..300 {
            if let Some(last) = self.shown.lock().unwrap().last().filter(|r| r.settled) {
                return Some(last.clone());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

struct NoPanel;

impl OptionPanel for NoPanel {
    fn mark_selected(&mut self, _index: usize) {}
    fn set_shown(&mut self, _shown: bool) {}
}

#[tokio::test]
async fn test_shorten() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let (addr, seen) = stub_endpoint().await?;
    let client = shortener(addr)?;

    let short = client
        .shorten(&ShortenRequest::new("https://example.com", Ttl::Hour))
        .await?;
    assert_eq!(short, "https://s.example/abc");
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["origin=https%3A%2F%2Fexample.com&ttl=3600".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_shorten_body_is_used_verbatim() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let padded = warp::post().map(|| "https://s.example/abc\n");
    let addr = free_addr()?;
    tokio::spawn(warp::serve(padded).run(addr));
    wait_ready(addr).await;

    let short = shortener(addr)?
        .shorten(&ShortenRequest::new("https://example.com", Ttl::Never))
        .await?;
    assert_eq!(short, "https://s.example/abc\n");

    Ok(())
}

#[tokio::test]
async fn test_shorten_rejected() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let rejected = warp::post().map(|| warp::reply::with_status("invalid ttl", warp::http::StatusCode::UNAUTHORIZED));
    let addr = free_addr()?;
    tokio::spawn(warp::serve(rejected).run(addr));
    wait_ready(addr).await;

    let err = shortener(addr)?
        .shorten(&ShortenRequest::new("https://example.com", Ttl::Never))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "invalid ttl");

    Ok(())
}

#[tokio::test]
async fn test_shorten_unreachable() -> Result<(), Box<dyn std::error::Error + 'static>> {
    // nothing listens on a freshly released port
    let addr = free_addr()?;
    let err = shortener(addr)?
        .shorten(&ShortenRequest::new("https://example.com", Ttl::Never))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(!err.to_string().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_history() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let (addr, _) = stub_endpoint().await?;
    let history = shortener(addr)?.history().await?;
    assert_eq!(history.ip, "127.0.0.1");
    assert_eq!(history.links.len(), 1);
    assert_eq!(history.links[0].alias, "abcde");
    assert_eq!(history.links[0].ttl_option(), Some(Ttl::Day));

    Ok(())
}

#[tokio::test]
async fn test_controller_round_trip() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let (addr, seen) = stub_endpoint().await?;
    let display = RecordingDisplay::default();
    let mut controller = SubmissionController::with_delay(
        Duration::from_millis(100),
        shortener(addr)?,
        display.clone(),
        NoPanel,
    );
    controller.select_ttl(1);

    assert!(controller.submit(Some("https://example.com")));
    assert!(!controller.submit(Some("https://example.org")));
    assert!(!controller.submit(Some("https://example.net")));

    let last = display.wait_settled().await.expect("no outcome was shown");
    assert_eq!(last.style, Style::Normal);
    assert_eq!(last.markup, r#"<a href="https://s.example/abc">https://s.example/abc</a>"#);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["origin=https%3A%2F%2Fexample.com&ttl=3600".to_string()]
    );

    let shown = display.shown.lock().unwrap().clone();
    assert_eq!(shown.len(), 2);
    assert!(!shown[0].settled);

    Ok(())
}

#[tokio::test]
async fn test_controller_reports_unreachable_endpoint() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let addr = free_addr()?;
    let display = RecordingDisplay::default();
    let mut controller = SubmissionController::with_delay(Duration::from_millis(50), shortener(addr)?, display.clone(), NoPanel);

    controller.submit(Some("https://example.com"));
    let last = display.wait_settled().await.expect("no outcome was shown");
    assert_eq!(last.style, Style::Error);
    assert!(!last.text.is_empty());

    Ok(())
}
