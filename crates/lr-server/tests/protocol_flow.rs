//! End-to-end protocol tests over a real WebSocket.

mod helpers;

use helpers::*;
use lr_server::ServerConfig;
use serde_json::json;

#[tokio::test]
async fn test_handshake_returns_server_hello() {
    let server = TestServer::start(ServerConfig::default().with_name("e2e")).await;
    let mut browser = server.connect().await;

    let hello = browser.handshake().await;

    assert_eq!(
        hello,
        json!({
            "command": "hello",
            "protocols": [
                "http://livereload.com/protocols/official-7",
                "http://livereload.com/protocols/official-8",
                "http://livereload.com/protocols/official-9",
                "http://livereload.com/protocols/2.x-origin-version-negotiation",
                "http://livereload.com/protocols/2.x-remote-control",
            ],
            "serverName": "e2e",
        })
    );
    server.wait_connected().await;
}

#[tokio::test]
async fn test_handshake_with_single_protocol() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect().await;

    browser
        .send_json(&json!({
            "command": "hello",
            "protocols": ["http://livereload.com/protocols/official-9"],
        }))
        .await;

    let hello = browser.recv().await.unwrap();
    assert_eq!(hello["command"], "hello");
    assert_eq!(hello["serverName"], "lrserver");
}

#[tokio::test]
async fn test_unsupported_protocols_drop_connection() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect().await;

    browser
        .send_json(&json!({
            "command": "hello",
            "protocols": ["http://example.com/not-livereload"],
        }))
        .await;

    browser.expect_dropped().await;
    assert!(!server.server.is_connected());
}

#[tokio::test]
async fn test_wrong_first_command_drops_connection() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect().await;

    browser
        .send_json(&json!({ "command": "info", "url": "http://localhost/" }))
        .await;

    browser.expect_dropped().await;
}

#[tokio::test]
async fn test_malformed_first_frame_drops_connection() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect().await;

    browser.send_text("{ not json").await;

    browser.expect_dropped().await;
}

#[tokio::test]
async fn test_reload_frame() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect_and_handshake().await;

    server.server.reload("css/site.css");

    assert_eq!(
        browser.recv().await.unwrap(),
        json!({ "command": "reload", "path": "css/site.css", "liveCSS": true })
    );
}

#[tokio::test]
async fn test_reload_frame_without_live_css() {
    let server = TestServer::start(ServerConfig::default().with_live_css(false)).await;
    let mut browser = server.connect_and_handshake().await;

    server.server.reload("index.html");

    assert_eq!(
        browser.recv().await.unwrap(),
        json!({ "command": "reload", "path": "index.html", "liveCSS": false })
    );
}

#[tokio::test]
async fn test_alert_frame() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect_and_handshake().await;

    server.server.alert("build failed: \"main.rs\"");

    assert_eq!(
        browser.recv().await.unwrap(),
        json!({ "command": "alert", "message": "build failed: \"main.rs\"" })
    );
}

#[tokio::test]
async fn test_requests_arrive_in_order() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect_and_handshake().await;

    server.server.reload("a.css");
    server.server.alert("between");
    server.server.reload("b.css");

    assert_eq!(browser.recv().await.unwrap()["path"], "a.css");
    assert_eq!(browser.recv().await.unwrap()["message"], "between");
    assert_eq!(browser.recv().await.unwrap()["path"], "b.css");
}

#[tokio::test]
async fn test_requests_from_other_threads() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect_and_handshake().await;

    let threads: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|side| {
            let server = server.server.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    server.reload(format!("{side}/{i}.css"));
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let mut left = Vec::new();
    let mut right = Vec::new();
    for _ in 0..20 {
        let frame = browser.recv().await.unwrap();
        let path = frame["path"].as_str().unwrap().to_string();
        if path.starts_with("left/") {
            left.push(path);
        } else {
            right.push(path);
        }
    }

    let expected = |side: &str| (0..10).map(|i| format!("{side}/{i}.css")).collect::<Vec<_>>();
    assert_eq!(left, expected("left"));
    assert_eq!(right, expected("right"));
}

#[tokio::test]
async fn test_nothing_sent_before_handshake() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect().await;

    server.server.reload("too-early.css");
    server.server.alert("too early");
    browser.expect_silence().await;

    browser.handshake().await;
    browser.expect_silence().await;
}

#[tokio::test]
async fn test_frames_after_handshake_are_ignored() {
    let server = TestServer::start_default().await;
    let mut browser = server.connect_and_handshake().await;

    browser
        .send_json(&json!({ "command": "info", "plugins": {}, "url": "http://localhost/" }))
        .await;
    browser.send_text("garbage").await;
    browser
        .send_json(&json!({ "command": "hello", "protocols": BROWSER_PROTOCOLS }))
        .await;
    browser.expect_silence().await;

    server.server.reload("still-here.css");
    assert_eq!(browser.recv().await.unwrap()["path"], "still-here.css");
}

#[tokio::test]
async fn test_new_connection_replaces_old() {
    let server = TestServer::start_default().await;
    let mut first = server.connect_and_handshake().await;
    let mut second = server.connect_and_handshake().await;

    server.server.reload("only-second.css");

    assert_eq!(second.recv().await.unwrap()["path"], "only-second.css");
    first.expect_silence().await;
}

#[tokio::test]
async fn test_replaced_connection_closing_keeps_new_one() {
    let server = TestServer::start_default().await;
    let first = server.connect_and_handshake().await;
    let mut second = server.connect_and_handshake().await;

    drop(first);
    tokio::time::sleep(QUIET_PERIOD).await;

    assert!(server.server.is_connected());
    server.server.alert("still routed");
    assert_eq!(second.recv().await.unwrap()["message"], "still routed");
}

#[tokio::test]
async fn test_browser_disconnect_clears_session() {
    let server = TestServer::start_default().await;
    let browser = server.connect_and_handshake().await;
    server.wait_connected().await;

    drop(browser);
    server.wait_disconnected().await;

    // Nothing to deliver to; must not block or panic.
    server.server.reload("nobody.css");
}

#[tokio::test]
async fn test_independent_servers() {
    let docs = TestServer::start(ServerConfig::default().with_name("docs")).await;
    let blog = TestServer::start(ServerConfig::default().with_name("blog")).await;

    let mut docs_browser = docs.connect().await;
    let mut blog_browser = blog.connect().await;

    assert_eq!(docs_browser.handshake().await["serverName"], "docs");
    assert_eq!(blog_browser.handshake().await["serverName"], "blog");

    docs.server.reload("docs.css");

    assert_eq!(docs_browser.recv().await.unwrap()["path"], "docs.css");
    blog_browser.expect_silence().await;
}
