use anyhow::Result;
use argocd_endpoint::accounts::{self, Session, TokenProvider, TokenProviderOptions, DEFAULT_USER_AGENT};
use argocd_endpoint::error::HttpFailure;
use argocd_endpoint::{Error, ErrorKind};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;

fn session(server: &MockServer, token: &str) -> Session {
    Session {
        server_url: server.uri(),
        user_agent: DEFAULT_USER_AGENT.to_string(),
        token: SecretString::from(token.to_string()),
        debug_client: false,
        timeout: None,
    }
}

#[tokio::test]
async fn login_posts_credentials_and_returns_session_token() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(header("content-type", "application/json; charset=UTF-8"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .and(body_json(json!({ "username": "admin", "password": "pw" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(support::token_body("abc"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let opts = TokenProviderOptions::new(server.uri());
    let token = accounts::login(&opts, "admin", &SecretString::from("pw")).await?;
    assert_eq!(token.expose_secret(), "abc");

    Ok(())
}

#[tokio::test]
async fn login_uses_configured_user_agent_and_trailing_slash_url() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(header("user-agent", "platform-bot/1.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(support::token_body("abc"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let opts = TokenProviderOptions {
        user_agent: Some("platform-bot/1.0".to_string()),
        ..TokenProviderOptions::new(format!("{}/", server.uri()))
    };
    let token = accounts::login(&opts, "admin", &SecretString::from("pw")).await?;
    assert_eq!(token.expose_secret(), "abc");

    Ok(())
}

#[tokio::test]
async fn login_rejects_non_200() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(ResponseTemplate::new(401).set_body_raw(
            r#"{"error":"Invalid username or password"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let opts = TokenProviderOptions::new(server.uri());
    let err = accounts::login(&opts, "admin", &SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::AuthFailed(HttpFailure::Status(s)) if s == StatusCode::UNAUTHORIZED),
        "unexpected error: {err}"
    );
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.is_retryable());

    Ok(())
}

#[tokio::test]
async fn login_rejects_body_without_token() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "text/plain"))
        .mount(&server)
        .await;

    let opts = TokenProviderOptions::new(server.uri());
    let err = accounts::login(&opts, "admin", &SecretString::from("pw"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::AuthFailed(HttpFailure::Decode(_))),
        "unexpected error: {err}"
    );

    Ok(())
}

#[tokio::test]
async fn mint_without_expiration_sends_bearer_and_empty_body() -> Result<()> {
    let server = MockServer::start().await;
    support::mount_mint(&server, "svc1", "abc", "xyz").await;

    let token = accounts::generate_token(&session(&server, "abc"), "svc1", 0).await?;
    assert_eq!(token.expose_secret(), "xyz");

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty(), "expected no request body");

    Ok(())
}

#[tokio::test]
async fn mint_with_expiration_sends_expires_in() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/account/svc1/token"))
        .and(header("authorization", "Bearer abc"))
        .and(body_json(json!({ "expiresIn": 3600 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(support::token_body("xyz"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = accounts::generate_token(&session(&server, "abc"), "svc1", 3600).await?;
    assert_eq!(token.expose_secret(), "xyz");

    Ok(())
}

#[tokio::test]
async fn mint_percent_encodes_account_name() -> Result<()> {
    let server = MockServer::start().await;
    support::mount_mint(&server, "team%20a", "abc", "xyz").await;

    let token = accounts::generate_token(&session(&server, "abc"), "team a", 0).await?;
    assert_eq!(token.expose_secret(), "xyz");

    Ok(())
}

#[tokio::test]
async fn mint_failure_names_the_account() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/account/ghost/token"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = accounts::generate_token(&session(&server, "abc"), "ghost", 0)
        .await
        .unwrap_err();

    match &err {
        Error::MintFailed { account, failure } => {
            assert_eq!(account, "ghost");
            assert!(matches!(failure, HttpFailure::Status(s) if *s == StatusCode::NOT_FOUND));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Auth);

    Ok(())
}

#[tokio::test]
async fn debug_client_dumps_request_and_response() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(support::token_body("abc"), "application/json"),
        )
        .mount(&server)
        .await;

    let logs = support::CapturedLogs::default();
    let _guard = logs.install();

    let opts = TokenProviderOptions {
        debug_client: true,
        ..TokenProviderOptions::new(server.uri())
    };
    let token = accounts::login(&opts, "admin", &SecretString::from("pw")).await?;
    assert_eq!(token.expose_secret(), "abc");

    let output = logs.contents();
    assert!(output.contains("argocd_endpoint::http_dump"), "{output}");
    assert!(output.contains("POST /api/v1/session HTTP/1.1"), "{output}");
    assert!(output.contains("content-type: application/json; charset=UTF-8"), "{output}");
    assert!(output.contains(r#"{"username":"admin","password":"pw"}"#), "{output}");
    assert!(output.contains("200 OK"), "{output}");
    assert!(output.contains(r#"{"token":"abc"}"#), "{output}");

    Ok(())
}

#[tokio::test]
async fn no_dump_without_debug_client() -> Result<()> {
    let server = MockServer::start().await;
    support::mount_mint(&server, "svc1", "abc", "xyz").await;

    let logs = support::CapturedLogs::default();
    let _guard = logs.install();

    let token = accounts::generate_token(&session(&server, "abc"), "svc1", 0).await?;
    assert_eq!(token.expose_secret(), "xyz");

    let output = logs.contents();
    assert!(!output.contains("argocd_endpoint::http_dump"), "{output}");
    assert!(!output.contains("xyz"), "{output}");

    Ok(())
}

#[tokio::test]
async fn debug_dump_keeps_response_head_when_body_is_cut_short() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.ends_with(b"}") {
            let n = socket.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\nx-trace: t1\r\n\r\n{\"to")
            .await?;
        socket.flush().await?;
        std::io::Result::Ok(())
    });

    let logs = support::CapturedLogs::default();
    let _guard = logs.install();

    let opts = TokenProviderOptions {
        debug_client: true,
        ..TokenProviderOptions::new(format!("http://{addr}"))
    };
    let err = accounts::login(&opts, "admin", &SecretString::from("pw"))
        .await
        .unwrap_err();
    server.await??;

    assert!(
        matches!(err, Error::AuthFailed(HttpFailure::Transport(_))),
        "unexpected error: {err}"
    );
    let output = logs.contents();
    assert!(output.contains("200 OK"), "{output}");
    assert!(output.contains("x-trace: t1"), "{output}");

    Ok(())
}

#[tokio::test]
async fn invalid_user_agent_falls_back_with_warning() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(support::token_body("abc"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let logs = support::CapturedLogs::default();
    let _guard = logs.install();

    let opts = TokenProviderOptions {
        user_agent: Some("bad\nagent".to_string()),
        ..TokenProviderOptions::new(server.uri())
    };
    let provider = TokenProvider::new(&opts)?;
    let token = provider
        .create_session("admin", &SecretString::from("pw"))
        .await?;
    assert_eq!(token.expose_secret(), "abc");

    let output = logs.contents();
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("Invalid user agent"), "{output}");

    Ok(())
}

#[tokio::test]
async fn missing_server_url_makes_no_request() -> Result<()> {
    let err = accounts::login(
        &TokenProviderOptions::new(""),
        "admin",
        &SecretString::from("pw"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::MissingServerUrl));
    assert_eq!(err.kind(), ErrorKind::Config);

    Ok(())
}
