use ppgee_core::{CredentialVerifier, MemoryDocumentStore, Repositories, TotpVerifier};
use ppgee_server::{build_router, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

async fn spawn_server(verifier: Option<Arc<dyn CredentialVerifier>>) -> SocketAddr {
    let repos = Repositories::new(Arc::new(MemoryDocumentStore::new()));
    let app = build_router(AppState::new(repos, verifier));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let body = body.unwrap_or("");
    let req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(req.as_bytes()).await.expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).expect("json body")
}

#[tokio::test]
async fn docentes_crud_round_trip() {
    let addr = spawn_server(None).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/docentes",
        Some(r#"{"id":"d1","nome":"Ana","email":"ana@ufpa.br"}"#),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(json_body(&body)["nome"], "Ana");

    let (status, _, body) = send_raw(
        addr,
        "PUT",
        "/api/docentes",
        Some(r#"{"id":"d1","fone":"9999"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let updated = json_body(&body);
    assert_eq!(updated["fone"], "9999");
    assert_eq!(updated["email"], "ana@ufpa.br");

    let (status, _, body) = send_raw(addr, "GET", "/api/docentes", None).await;
    assert_eq!(status, 200);
    let listed = json_body(&body);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["fone"], "9999");

    let (status, _, body) = send_raw(addr, "DELETE", "/api/docentes?id=d1", None).await;
    assert_eq!(status, 200);
    assert_eq!(json_body(&body), json!({"message": "Docente deleted"}));

    let (_, _, body) = send_raw(addr, "GET", "/api/docentes", None).await;
    assert_eq!(json_body(&body), json!([]));
}

#[tokio::test]
async fn post_array_creates_every_record() {
    let addr = spawn_server(None).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/api/alunos-regulares",
        Some(r#"[{"id":"a1","nome":"Bia"},{"id":"a2","nome":"Caio"}]"#),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(json_body(&body).as_array().map(Vec::len), Some(2));

    let (_, _, body) = send_raw(addr, "GET", "/api/alunos-regulares", None).await;
    assert_eq!(json_body(&body).as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn put_of_unknown_record_is_not_found() {
    let addr = spawn_server(None).await;

    let (status, _, body) =
        send_raw(addr, "PUT", "/api/turmas", Some(r#"{"id":"missing"}"#)).await;
    assert_eq!(status, 404);
    assert_eq!(json_body(&body), json!({"message": "Turma not found"}));
}

#[tokio::test]
async fn delete_requires_exactly_one_id() {
    let addr = spawn_server(None).await;

    for path in ["/api/projetos", "/api/projetos?id=", "/api/projetos?id=a&id=b"] {
        let (status, _, body) = send_raw(addr, "DELETE", path, None).await;
        assert_eq!(status, 400, "path {path}");
        assert_eq!(json_body(&body), json!({"message": "Invalid ID"}));
    }
}

#[tokio::test]
async fn unsupported_method_lists_allowed_methods() {
    let addr = spawn_server(None).await;

    let (status, head, body) = send_raw(addr, "PATCH", "/api/periodicos", None).await;
    assert_eq!(status, 405);
    assert!(head
        .to_ascii_lowercase()
        .contains("allow: get, post, put, delete"));
    assert_eq!(body, "Method PATCH Not Allowed");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let addr = spawn_server(None).await;

    let (status, _, _) = send_raw(addr, "POST", "/api/graduates", Some("{not json")).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn login_accepts_current_code_and_rejects_others() {
    let totp = TotpVerifier::from_base32(SECRET).expect("secret");
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs();
    let code = totp.code_at(now).expect("code");
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(totp.with_window(1));
    let addr = spawn_server(Some(verifier)).await;

    let request = json!({ "token": code }).to_string();
    let (status, _, body) = send_raw(addr, "POST", "/api/login", Some(&request)).await;
    assert_eq!(status, 200);
    assert_eq!(json_body(&body), json!({"success": true}));

    let (status, _, body) =
        send_raw(addr, "POST", "/api/login", Some(r#"{"token":"abcdef"}"#)).await;
    assert_eq!(status, 401);
    assert_eq!(json_body(&body), json!({"error": "Invalid token"}));

    let (status, _, body) = send_raw(addr, "POST", "/api/login", Some("{}")).await;
    assert_eq!(status, 400);
    assert_eq!(json_body(&body), json!({"error": "Token is required"}));

    let (status, _, body) = send_raw(addr, "GET", "/api/login", None).await;
    assert_eq!(status, 405);
    assert_eq!(json_body(&body), json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn login_without_secret_is_internal_error() {
    let addr = spawn_server(None).await;

    let (status, _, body) =
        send_raw(addr, "POST", "/api/login", Some(r#"{"token":"123456"}"#)).await;
    assert_eq!(status, 500);
    assert_eq!(json_body(&body), json!({"error": "Internal server error"}));
}
