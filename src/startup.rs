use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlers;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::email_client::MailTransport;
use crate::email_client::SmtpMailer;
use crate::mailing_list::MailingListClient;
use crate::routes::health_check;
use crate::routes::method_not_allowed;
use crate::routes::newsletter_subscribe;
use crate::routes::payload_too_large;
use crate::routes::send_mail;
use crate::routes::MAX_BODY_BYTES;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Binds the configured address and builds a `Server` that relays contact
    /// inquiries over SMTP
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        Self::build_with_mailer(cfg, Arc::new(SmtpMailer)).await
    }

    /// As `build`, but with the given mail transport
    pub async fn build_with_mailer(
        cfg: Settings,
        mailer: Arc<dyn MailTransport>,
    ) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        // port 0 asks the OS for a random one; keep what was assigned
        let port = listener.local_addr()?.port();

        let list_client = MailingListClient::new(cfg.mailchimp.timeout())?;
        let server = run(listener, cfg, list_client, mailer)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Upstream credentials are resolved per request, so a server with missing
/// secrets still starts (and answers `/health_check`).
pub fn run(
    listener: TcpListener,
    cfg: Settings,
    list_client: MailingListClient,
    mailer: Arc<dyn MailTransport>,
) -> Result<Server, anyhow::Error> {
    // `Data` is externally an `Arc`, so every worker shares one copy
    let mailchimp = Data::new(cfg.mailchimp);
    let smtp = Data::new(cfg.smtp);
    let contact = Data::new(cfg.contact);
    let list_client = Data::new(list_client);
    let mailer: Data<dyn MailTransport> = Data::from(mailer);

    // one `App` is built per worker, hence the clones
    let server = HttpServer::new(move || {
        App::new()
            .wrap(ErrorHandlers::new().handler(StatusCode::PAYLOAD_TOO_LARGE, payload_too_large))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/newsletter-subscribe")
                    .route(web::post().to(newsletter_subscribe))
                    .default_service(web::route().to(method_not_allowed)),
            )
            .service(
                web::resource("/send-mail")
                    .route(web::post().to(send_mail))
                    .default_service(web::route().to(method_not_allowed)),
            )
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .app_data(mailchimp.clone())
            .app_data(smtp.clone())
            .app_data(contact.clone())
            .app_data(list_client.clone())
            .app_data(mailer.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
