//! End-to-end tests: real server, mock verification service, mock backend.

use std::time::Duration;

use serde_json::{json, Value};

mod common;

const TOKEN: &str = "human-token";

fn signup(email: &str, token: &str) -> Value {
    json!({
        "email": email,
        "password": "abcd1234",
        "name": "Jane Doe",
        "captcha": token,
    })
}

fn assert_decorated(headers: &reqwest::header::HeaderMap) {
    assert_eq!(headers["content-security-policy"], "default-src 'none'; frame-ancestors 'none';");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(headers["cache-control"], "no-store");
    assert_eq!(headers["access-control-allow-origin"], "https://infosecbyalex.xyz");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_valid_signup_is_forwarded_and_relayed() {
    let (verifier, verify_calls) = common::start_mock_verifier(TOKEN).await;
    let (backend, backend_calls) = common::start_mock_backend(201, r#"{"id":1}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(backend))).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .header("cf-connecting-ip", "203.0.113.10")
        .json(&json!({
            "email": " a@b.co ",
            "password": "abcd1234",
            "name": "<Jane> Doe",
            "g-recaptcha-response": TOKEN,
        }))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 201);
    assert_decorated(res.headers());
    assert_eq!(res.text().await.unwrap(), r#"{"id":1}"#);

    // Verification got the token, the secret and the caller's address.
    let form = verify_calls.lock().unwrap()[0].clone();
    assert!(form.contains("response=human-token"));
    assert!(form.contains("secret=test-secret"));
    assert!(form.contains("remoteip=203.0.113.10"));

    // Backend got the sanitized fields only.
    let forwarded: Value = serde_json::from_str(&backend_calls.lock().unwrap()[0]).unwrap();
    assert_eq!(
        forwarded,
        json!({ "email": "a@b.co", "password": "abcd1234", "name": "Jane Doe" })
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_backend_error_status_is_relayed() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (backend, _) = common::start_mock_backend(409, r#"{"error":"exists"}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(backend))).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&signup("taken@b.co", TOKEN))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 409);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), r#"{"error":"exists"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unconfigured_backend_is_500() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, None)).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&signup("a@b.co", TOKEN))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_decorated(res.headers());
    assert_eq!(res.text().await.unwrap(), "Backend URL not configured");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;

    // Reserve a port, then free it so nothing is listening there.
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(dead))).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&signup("a@b.co", TOKEN))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert!(res.text().await.unwrap().starts_with("Backend error: "));

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_backend_is_502() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (backend, _) = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (201, "application/json", r#"{"id":1}"#.to_string())
    })
    .await;

    let mut config = common::gateway_config(verifier, Some(backend));
    config.timeouts.request_secs = 1;
    let (gateway, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&signup("a@b.co", TOKEN))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert_decorated(res.headers());
    assert!(res.text().await.unwrap().starts_with("Backend error: "));

    shutdown.trigger();
}

#[tokio::test]
async fn test_failed_challenge_is_403() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (backend, backend_calls) = common::start_mock_backend(201, r#"{"id":1}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(backend))).await;

    let client = common::client();
    for body in [
        signup("a@b.co", "forged-token"),
        json!({ "email": "a@b.co", "password": "abcd1234", "name": "Jane" }),
    ] {
        let res = client
            .post(format!("http://{}/", gateway))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 403);
        assert_eq!(res.text().await.unwrap(), "CAPTCHA verification failed");
    }
    assert!(backend_calls.lock().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_verification_service_error_is_403() {
    let (verifier, _) = common::start_programmable_backend(|_| async {
        (500, "text/plain", "boom".to_string())
    })
    .await;
    let (backend, _) = common::start_mock_backend(201, r#"{"id":1}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(backend))).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&signup("a@b.co", TOKEN))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_fields_are_400_after_verification() {
    let (verifier, verify_calls) = common::start_mock_verifier(TOKEN).await;
    let (backend, backend_calls) = common::start_mock_backend(201, r#"{"id":1}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(backend))).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&json!({
            "email": "a@b.co",
            "password": "abcdefgh",
            "name": "Jane",
            "captcha_token": TOKEN,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    assert_decorated(res.headers());
    assert_eq!(res.text().await.unwrap(), "Invalid password");
    assert_eq!(verify_calls.lock().unwrap().len(), 1);
    assert!(backend_calls.lock().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_preflight_skips_everything() {
    let (verifier, verify_calls) = common::start_mock_verifier(TOKEN).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, None)).await;

    let client = common::client();
    // Far more preflights than the rate limit allows.
    for _ in 0..10 {
        let res = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/", gateway))
            .header("origin", "https://infosecbyalex.xyz")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 204);
        assert_decorated(res.headers());
        assert!(res.text().await.unwrap().is_empty());
    }
    assert!(verify_calls.lock().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_get_is_405() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, None)).await;

    let res = common::client()
        .get(format!("http://{}/", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 405);
    assert_decorated(res.headers());
    assert_eq!(res.text().await.unwrap(), "Method Not Allowed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_rate_limit_blocks_sixth_attempt_per_email() {
    let (verifier, verify_calls) = common::start_mock_verifier(TOKEN).await;
    let (backend, _) = common::start_mock_backend(201, r#"{"id":1}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, Some(backend))).await;

    let client = common::client();
    let url = format!("http://{}/", gateway);

    for _ in 0..5 {
        let res = client.post(&url).json(&signup("Spam@B.co", TOKEN)).send().await.unwrap();
        assert_eq!(res.status(), 201);
    }

    // Same mailbox, different case and padding: same bucket.
    let res = client.post(&url).json(&signup("  spam@b.co ", TOKEN)).send().await.unwrap();
    assert_eq!(res.status(), 429);
    assert_decorated(res.headers());
    assert_eq!(res.text().await.unwrap(), "Too Many Requests. Please try again later.");

    // Blocked requests never reach the verification service.
    let res = client.post(&url).json(&signup("spam@b.co", TOKEN)).send().await.unwrap();
    assert_eq!(res.status(), 429);
    assert_eq!(verify_calls.lock().unwrap().len(), 5);

    // A different email is unaffected.
    let res = client.post(&url).json(&signup("other@b.co", TOKEN)).send().await.unwrap();
    assert_eq!(res.status(), 201);

    shutdown.trigger();
}

#[tokio::test]
async fn test_rate_limit_by_address_when_no_email() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, None)).await;

    let client = common::client();
    let url = format!("http://{}/", gateway);

    for _ in 0..5 {
        let res = client
            .post(&url)
            .header("cf-connecting-ip", "198.51.100.1")
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 403);
    }
    let res = client
        .post(&url)
        .header("cf-connecting-ip", "198.51.100.1")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);

    // Another address has its own bucket.
    let res = client
        .post(&url)
        .header("cf-connecting-ip", "198.51.100.2")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let (verifier, _) = common::start_mock_verifier(TOKEN).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(verifier, None)).await;

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = common::client()
        .post(format!("http://{}/", gateway))
        .json(&signup("a@b.co", TOKEN))
        .send()
        .await;
    assert!(res.is_err(), "Gateway should be down after shutdown");
}
