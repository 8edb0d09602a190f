use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use secrecy::Secret;
use submission_gateway::configuration::get_configuration;
use submission_gateway::configuration::Settings;
use submission_gateway::configuration::SmtpConfig;
use submission_gateway::email_client::Email;
use submission_gateway::email_client::MailTransport;
use submission_gateway::email_client::MailerError;
use submission_gateway::email_client::SmtpMailer;
use submission_gateway::startup::Application;
use submission_gateway::telemetry::get_subscriber;
use submission_gateway::telemetry::init_subscriber;
use wiremock::MockServer;

/// Init the subscriber once for the whole test binary.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

/// Stands in for the SMTP relay. Every attempt is recorded, including the one
/// that fails.
#[derive(Default)]
pub struct FakeMailer {
    /// 1-based attempt that should fail
    pub fail_on: Option<usize>,
    pub sent: Mutex<Vec<Email>>,
}

impl FakeMailer {
    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on: Some(attempt),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<Email> { self.sent.lock().unwrap().clone() }
}

#[async_trait]
impl MailTransport for FakeMailer {
    async fn send(
        &self,
        smtp: &SmtpConfig,
        email: Email,
    ) -> Result<(), MailerError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(email);
        match self.fail_on == Some(sent.len()) {
            true => Err(MailerError::Timeout(smtp.timeout)),
            false => Ok(()),
        }
    }
}

pub struct TestApp {
    pub addr: String,
    /// Simulates the Mailchimp marketing API
    pub mailchimp_server: MockServer,
    pub mailer: Arc<FakeMailer>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}{path}", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_form(
        &self,
        path: &str,
        body: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}{path}", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get(
        &self,
        path: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}{path}", self.addr))
            .send()
            .await
            .expect("execute request")
    }
}

/// Spawn the server on a random port, with complete upstream settings, the
/// list API pointed at a `MockServer` and a `FakeMailer` that always succeeds.
pub async fn spawn_app() -> TestApp { spawn_app_with(|_| {}, FakeMailer::default()).await }

/// As `spawn_app`, but `customise` may edit the settings before the server is
/// built
pub async fn spawn_app_with(
    customise: impl FnOnce(&mut Settings),
    mailer: FakeMailer,
) -> TestApp {
    let mailer = Arc::new(mailer);
    launch(customise, mailer.clone(), mailer).await
}

/// As `spawn_app_with`, but mail goes through the real SMTP transport; the
/// returned `mailer` records nothing
pub async fn spawn_app_with_transport(customise: impl FnOnce(&mut Settings)) -> TestApp {
    launch(
        customise,
        Arc::new(SmtpMailer),
        Arc::new(FakeMailer::default()),
    )
    .await
}

async fn launch(
    customise: impl FnOnce(&mut Settings),
    transport: Arc<dyn MailTransport>,
    mailer: Arc<FakeMailer>,
) -> TestApp {
    Lazy::force(&TRACING);

    let mailchimp_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("read configuration");
        // port 0 is reserved by the OS; the server will be spawned on an address with a
        // random available port
        cfg.application.port = 0;

        cfg.mailchimp.api_key = Some(Secret::new("test-api-key-us21".to_string()));
        cfg.mailchimp.audience_id = Some("audience123".to_string());
        cfg.mailchimp.dc = None;
        cfg.mailchimp.base_url = Some(mailchimp_server.uri());

        cfg.smtp.host = Some("smtp.example.com".to_string());
        cfg.smtp.port = Some("587".to_string());
        cfg.smtp.username = Some("owner@example.com".to_string());
        cfg.smtp.password = Some(Secret::new("hunter2".to_string()));
        cfg.smtp.security = Some("starttls".to_string());
        cfg.contact.owner_address = None;

        customise(&mut cfg);
        cfg
    };

    let app = Application::build_with_mailer(cfg, transport)
        .await
        .expect("build application");
    let addr = format!("http://127.0.0.1:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        mailchimp_server,
        mailer,
        api_client: reqwest::Client::new(),
    }
}
