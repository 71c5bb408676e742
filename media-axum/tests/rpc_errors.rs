use std::io;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use bytes::Bytes;
use http_body_util::BodyExt;
use media_axum::{axum as media_app, MediaAxumApp};
use media_blob::{
    ByteStream, GetResult, MediaAdapter, MediaConfig, MediaError, MediaResult, MediaStore,
    MemoryStore, PutResult,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Store whose object bodies break after the first read
struct BrokenBodyStore;

#[async_trait::async_trait]
impl MediaStore for BrokenBodyStore {
    async fn put(&self, key: &str, _size: Option<u64>, _ct: Option<&str>, _stream: ByteStream) -> MediaResult<PutResult> {
        Ok(PutResult { key: key.to_string(), size_bytes: 0, etag: None })
    }

    async fn get(&self, _key: &str) -> MediaResult<GetResult> {
        let parts: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from(vec![1u8; 40_000])),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
        ];
        Ok(GetResult { stream: Box::pin(futures::stream::iter(parts)), size_bytes: 80_000, content_type: None })
    }

    async fn delete(&self, _key: &str) -> MediaResult<()> {
        Err(MediaError::backend(io::Error::new(io::ErrorKind::PermissionDenied, "access denied")))
    }

    fn url(&self, _key: &str) -> String {
        String::new()
    }
}

fn memory_app() -> (MediaAxumApp, MemoryStore) {
    let store = MemoryStore::new().with_public_url("http://cdn.example.com", "media");
    let app = media_app(MediaAdapter::new(store.clone(), MediaConfig::default()));
    (app, store)
}

fn rpc(method: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/media.v1.MediaService/{method}"))
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn call(app: &MediaAxumApp, req: Request<Body>) -> axum::response::Response {
    app.router.clone().oneshot(req).await.unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn ndjson_body(res: axum::response::Response) -> Vec<Value> {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    bytes
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).unwrap())
        .collect()
}

#[tokio::test]
async fn upload_then_download_over_json() {
    let (app, _store) = memory_app();

    let res = call(
        &app,
        rpc("Upload", json!({"fileName": "hello.txt", "content": "aGVsbG8=", "contentType": "text/plain"}).to_string()),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    let uploaded = json_body(res).await;
    let path = uploaded["filePath"].as_str().unwrap().to_string();
    assert!(path.ends_with(".txt"));
    assert_eq!(uploaded["fileSize"], 5);
    assert_eq!(uploaded["url"], format!("http://cdn.example.com/media/{path}"));
    assert!(uploaded["uploadedAt"].as_str().unwrap().ends_with('Z'));

    let res = call(&app, rpc("Download", json!({"filePath": path}).to_string())).await;
    assert_eq!(res.status().as_u16(), 200);
    let file = json_body(res).await;
    assert_eq!(file["content"], "aGVsbG8=");
    assert_eq!(file["fileName"], path.as_str());
    assert_eq!(file["contentType"], "application/octet-stream");
    assert_eq!(file["fileSize"], 5);
}

#[tokio::test]
async fn upload_stream_over_ndjson() {
    let (app, store) = memory_app();

    let body = concat!(
        r#"{"metadata":{"fileName":"a.txt","fileSize":5,"contentType":"text/plain"}}"#, "\n",
        r#"{"chunk":"aGU="}"#, "\n",
        r#"{"chunk":"bGxv"}"#, "\n",
    );
    let res = call(&app, rpc("UploadStream", body)).await;
    assert_eq!(res.status().as_u16(), 200);

    let uploaded = json_body(res).await;
    let path = uploaded["filePath"].as_str().unwrap();
    assert_eq!(uploaded["fileSize"], 5);
    assert_eq!(store.object(path).unwrap(), Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn upload_stream_starting_with_chunk_is_invalid_argument() {
    let (app, store) = memory_app();

    let res = call(&app, rpc("UploadStream", "{\"chunk\":\"aGk=\"}\n")).await;
    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["code"], "invalid_argument");
    assert_eq!(body["message"], "first message must be metadata");
    assert!(store.is_empty());
}

#[tokio::test]
async fn broken_upload_stream_is_internal_and_stores_nothing() {
    let (app, store) = memory_app();

    let body = "{\"metadata\":{\"fileName\":\"a.txt\"}}\n{\"chunk\":\"aGk=\"}\nnot json\n";
    let res = call(&app, rpc("UploadStream", body)).await;
    assert_eq!(res.status().as_u16(), 500);
    assert_eq!(json_body(res).await["code"], "internal");
    assert!(store.is_empty());
}

#[tokio::test]
async fn download_stream_sends_metadata_then_chunks() {
    let (app, _store) = memory_app();
    let content = vec![9u8; 70_000];
    let encoded = media_axum::wire::encode_bytes(&content);

    let res = call(
        &app,
        rpc("Upload", json!({"fileName": "big.bin", "content": encoded}).to_string()),
    )
    .await;
    let path = json_body(res).await["filePath"].as_str().unwrap().to_string();

    let res = call(&app, rpc("DownloadStream", json!({"filePath": path}).to_string())).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers().get("content-type").unwrap(), "application/x-ndjson");

    let lines = ndjson_body(res).await;
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["metadata"]["fileName"], path.as_str());

    let mut joined = Vec::new();
    for line in &lines[1..] {
        let chunk = media_axum::wire::decode_bytes(line["chunk"].as_str().unwrap()).unwrap();
        joined.extend_from_slice(&chunk);
    }
    assert_eq!(joined, content);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let (app, _store) = memory_app();

    for method in ["Download", "DownloadStream"] {
        let res = call(&app, rpc(method, json!({"filePath": "nonexistent/key"}).to_string())).await;
        assert_eq!(res.status().as_u16(), 404, "{method}");
        let body = json_body(res).await;
        assert_eq!(body["code"], "not_found");
        assert!(body["message"].as_str().unwrap().contains("nonexistent/key"));
    }
}

#[tokio::test]
async fn mid_stream_failure_ends_with_error_line() {
    let app = media_app(MediaAdapter::new(BrokenBodyStore, MediaConfig::default()));

    let res = call(&app, rpc("DownloadStream", json!({"filePath": "2024/01/01/x.bin"}).to_string())).await;
    assert_eq!(res.status().as_u16(), 200);

    let lines = ndjson_body(res).await;
    assert!(lines[0].get("metadata").is_some());
    assert!(lines[1].get("chunk").is_some());
    assert_eq!(lines.last().unwrap()["error"]["code"], "internal");
}

#[tokio::test]
async fn delete_reports_success_and_failure() {
    let (app, store) = memory_app();
    let res = call(&app, rpc("Upload", json!({"fileName": "a.txt", "content": "eA=="}).to_string())).await;
    let path = json_body(res).await["filePath"].as_str().unwrap().to_string();

    let res = call(&app, rpc("Delete", json!({"filePath": path}).to_string())).await;
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "File deleted successfully");
    assert!(!store.contains(&path));

    let failing = media_app(MediaAdapter::new(BrokenBodyStore, MediaConfig::default()));
    let res = call(&failing, rpc("Delete", json!({"filePath": "a"}).to_string())).await;
    assert_eq!(res.status().as_u16(), 500);
    assert_eq!(json_body(res).await["code"], "internal");
}

#[tokio::test]
async fn url_and_file_info_are_derived() {
    let (app, _store) = memory_app();

    let res = call(&app, rpc("GetURL", json!({"filePath": "2024/01/01/abc.png"}).to_string())).await;
    assert_eq!(json_body(res).await["url"], "http://cdn.example.com/media/2024/01/01/abc.png");

    let res = call(&app, rpc("GetFileInfo", json!({"filePath": "2024/01/01/abc.png"}).to_string())).await;
    let body = json_body(res).await;
    assert_eq!(body["filePath"], "2024/01/01/abc.png");
    assert_eq!(body["url"], "http://cdn.example.com/media/2024/01/01/abc.png");
}

#[tokio::test]
async fn malformed_json_is_invalid_argument() {
    let (app, _store) = memory_app();

    let res = call(&app, rpc("Download", "{\"filePath\":")).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["code"], "invalid_argument");

    let res = call(&app, rpc("Upload", json!({"fileName": "a", "content": "%%%"}).to_string())).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["code"], "invalid_argument");
}

#[tokio::test]
async fn request_id_is_preserved_and_health_answers() {
    let (app, _store) = memory_app();

    let provided = HeaderValue::from_static("req-test-123");
    let res = call(
        &app,
        Request::builder()
            .method("GET")
            .uri("/health")
            .header("x-request-id", provided.clone())
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}
