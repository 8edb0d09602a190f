use serde_json::json;
use serde_json::Value;
use submission_gateway::configuration::Settings;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::spawn_app_with_transport;
use crate::helpers::FakeMailer;

fn inquiry() -> Value {
    json!({
        "fullName": "Jane Doe",
        "email": "jane@foo.com",
        "phone": "0400 000 000",
        "subject": "Partnership",
        "enquiryType": "Business",
        "message": "Hello there",
    })
}

#[tokio::test]
async fn send_mail_ok() {
    let app = spawn_app().await;

    let resp = app.post_json("/send-mail", &inquiry()).await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"success": true, "message": "Message sent successfully."})
    );

    let sent = app.mailer.attempts();
    assert_eq!(sent.len(), 2);

    // the owner is notified first, from the authenticated account
    let notification = &sent[0];
    assert_eq!(notification.to.email.to_string(), "owner@example.com");
    assert_eq!(notification.from.email.to_string(), "owner@example.com");
    assert_eq!(
        notification.reply_to.as_ref().unwrap().email.to_string(),
        "jane@foo.com"
    );
    assert_eq!(
        notification.subject,
        "New Contact Form Submission - Partnership"
    );
    for field in [
        "Jane Doe",
        "jane@foo.com",
        "0400 000 000",
        "Business",
        "Hello there",
    ] {
        assert!(notification.html_body.contains(field), "{field}");
    }

    let confirmation = &sent[1];
    assert_eq!(confirmation.to.email.to_string(), "jane@foo.com");
    assert_eq!(confirmation.subject, "Thanks for contacting AusInd Bridge");
}

#[tokio::test]
async fn send_mail_form_with_name_alias() {
    let app = spawn_app().await;

    let resp = app
        .post_form(
            "/send-mail",
            "name=Jane+Doe&email=jane%40foo.com&subject=Hi&enquiryType=General&message=Hello",
        )
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let sent = app.mailer.attempts();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].html_body.contains("Jane Doe"));
    assert_eq!(sent[1].to.name.as_deref(), Some("Jane Doe"));
}

#[tokio::test]
async fn send_mail_configured_owner() {
    let app = spawn_app_with(
        |cfg| cfg.contact.owner_address = Some("inbox@example.com".to_string()),
        FakeMailer::default(),
    )
    .await;

    let resp = app.post_json("/send-mail", &inquiry()).await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        app.mailer.attempts()[0].to.email.to_string(),
        "inbox@example.com"
    );
}

#[tokio::test]
async fn send_mail_escapes_markup() {
    let app = spawn_app().await;
    let mut body = inquiry();
    body["message"] = json!("<script>alert('hi')</script>");
    body["subject"] = json!("Fish & chips");

    let resp = app.post_json("/send-mail", &body).await;

    assert_eq!(resp.status().as_u16(), 200);
    let notification = &app.mailer.attempts()[0];
    assert!(!notification.html_body.contains("<script>"));
    assert!(notification.html_body.contains("&lt;script&gt;"));
    assert!(notification.html_body.contains("Fish &amp; chips"));
}

#[tokio::test]
async fn send_mail_missing_fields() {
    let app = spawn_app().await;

    for field in ["fullName", "email", "subject", "enquiryType", "message"] {
        let mut body = inquiry();
        body.as_object_mut().unwrap().remove(field);

        let resp = app.post_json("/send-mail", &body).await;

        assert_eq!(resp.status().as_u16(), 400, "{field}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Missing required fields."}),
            "{field}"
        );
    }

    let resp = app.post_form("/send-mail", "").await;
    assert_eq!(resp.status().as_u16(), 400);

    assert!(app.mailer.attempts().is_empty());
}

#[tokio::test]
async fn send_mail_invalid_email() {
    let app = spawn_app().await;

    for email in ["not-an-email", "john..doe@foo.com", ".john@foo.com"] {
        let mut body = inquiry();
        body["email"] = json!(email);

        let resp = app.post_json("/send-mail", &body).await;

        assert_eq!(resp.status().as_u16(), 400, "{email}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Invalid email address."}),
            "{email}"
        );
    }
    assert!(app.mailer.attempts().is_empty());
}

#[tokio::test]
async fn send_mail_name_with_line_break() {
    let app = spawn_app().await;
    let mut body = inquiry();
    body["fullName"] = json!("Eve\nDoe");

    let resp = app.post_json("/send-mail", &body).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"success": false, "message": "Name contains invalid characters."})
    );
    assert!(app.mailer.attempts().is_empty());
}

/// Exercises the real SMTP transport up to the point of connecting, so the
/// message is actually built; nothing listens on the port
#[tokio::test]
async fn send_mail_real_transport_without_server() {
    let app = spawn_app_with_transport(|cfg| {
        cfg.smtp.host = Some("127.0.0.1".to_string());
        // reserved, nothing listens there
        cfg.smtp.port = Some("1".to_string());
        cfg.smtp.timeout_milliseconds = 2000;
    })
    .await;

    let resp = app.post_json("/send-mail", &inquiry()).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Mailer Error: your message could not be sent. Please try again later."
    );
}

#[tokio::test]
async fn send_mail_name_too_long() {
    let app = spawn_app().await;
    let mut body = inquiry();
    body["fullName"] = json!("a".repeat(257));

    let resp = app.post_json("/send-mail", &body).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Name is too long.");
    assert!(app.mailer.attempts().is_empty());
}

#[tokio::test]
async fn send_mail_owner_notification_fails() {
    let app = spawn_app_with(|_| {}, FakeMailer::failing_on(1)).await;

    let resp = app.post_json("/send-mail", &inquiry()).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "Mailer Error: your message could not be sent. Please try again later.",
        })
    );
    // the confirmation is never attempted
    assert_eq!(app.mailer.attempts().len(), 1);
}

#[tokio::test]
async fn send_mail_confirmation_fails() {
    let app = spawn_app_with(|_| {}, FakeMailer::failing_on(2)).await;

    let resp = app.post_json("/send-mail", &inquiry()).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "Your message was received, but the confirmation email could not be sent.",
            "ownerNotified": true,
            "confirmationSent": false,
        })
    );
    assert_eq!(app.mailer.attempts().len(), 2);
}

#[tokio::test]
async fn send_mail_without_configuration() {
    let cases: [(&str, fn(&mut Settings)); 3] = [
        ("host", |cfg| cfg.smtp.host = None),
        ("password", |cfg| cfg.smtp.password = None),
        ("port", |cfg| cfg.smtp.port = Some("not-a-port".to_string())),
    ];
    for (name, customise) in cases {
        let app = spawn_app_with(customise, FakeMailer::default()).await;

        let resp = app.post_json("/send-mail", &inquiry()).await;

        assert_eq!(resp.status().as_u16(), 500, "{name}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"success": false, "message": "Server email configuration is missing."}),
            "{name}"
        );
        assert!(app.mailer.attempts().is_empty(), "{name}");
    }
}

#[tokio::test]
async fn send_mail_wrong_method() {
    let app = spawn_app().await;

    for resp in [
        app.get("/send-mail").await,
        app.api_client
            .put(format!("{}/send-mail", app.addr))
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(resp.status().as_u16(), 405);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Method Not Allowed");
    }
}
