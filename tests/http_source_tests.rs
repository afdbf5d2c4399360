use framecheck_media::{FetchError, HttpMediaSource, MediaSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve canned responses for the routes the media source hits.
async fn spawn_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = match socket.read(&mut buf).await {
                    Ok(n) if n > 0 => n,
                    _ => return,
                };
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();

                let (status, content_type, body): (&str, &str, Vec<u8>) = match path.as_str() {
                    "/api/videos" => (
                        "200 OK",
                        "application/json",
                        br#"[{"id":"vid-1","title":"First clip","url":"http://unused/media/vid-1"}]"#
                            .to_vec(),
                    ),
                    "/api/videos/vid-1" => (
                        "200 OK",
                        "application/json",
                        br#"{"id":"vid-1","title":"First clip","description":"qc pass","url":"http://unused/media/vid-1","content_type":"video/mp4"}"#
                            .to_vec(),
                    ),
                    "/media/vid-1" => ("200 OK", "video/mp4", vec![0xDE, 0xAD, 0xBE, 0xEF]),
                    _ => ("404 Not Found", "text/plain", b"not found".to_vec()),
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    content_type,
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.write_all(&body).await;
            });
        }
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_list_media() {
    let base = spawn_backend().await;
    let source = HttpMediaSource::new(format!("{}/api", base), 5);

    let items = source.list_media().await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "vid-1");
    assert_eq!(items[0].title, "First clip");
}

#[tokio::test]
async fn test_fetch_metadata_then_bytes() {
    let base = spawn_backend().await;
    let source = HttpMediaSource::new(format!("{}/api/", base), 5);

    let info = source.fetch_metadata("vid-1").await.unwrap();
    assert_eq!(info.description.as_deref(), Some("qc pass"));
    assert_eq!(info.content_type.as_deref(), Some("video/mp4"));

    let bytes = source
        .fetch_bytes(&format!("{}/media/vid-1", base))
        .await
        .unwrap();
    assert_eq!(bytes, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[tokio::test]
async fn test_missing_item_is_a_status_error() {
    let base = spawn_backend().await;
    let source = HttpMediaSource::new(format!("{}/api", base), 5);

    let result = source.fetch_metadata("vid-404").await;

    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
}
