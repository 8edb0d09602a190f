use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::FakeMailer;

#[tokio::test]
async fn health_check() {
    let app = spawn_app().await;

    let resp = app.get("/health_check").await;
    assert!(resp.status().is_success());
    assert_eq!(resp.content_length().unwrap(), 0); // empty body
}

/// Upstream credentials are only needed per request
#[tokio::test]
async fn health_check_without_upstream_config() {
    let app = spawn_app_with(
        |cfg| {
            cfg.mailchimp.api_key = None;
            cfg.smtp.host = None;
        },
        FakeMailer::default(),
    )
    .await;

    let resp = app.get("/health_check").await;
    assert_eq!(resp.status().as_u16(), 200);
}
