use std::fmt::Debug;
use std::fmt::Display;

use submission_gateway::configuration::get_configuration;
use submission_gateway::startup::Application;
use submission_gateway::telemetry::get_subscriber;
use submission_gateway::telemetry::init_subscriber;
use tokio::task::JoinError;

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }

        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (inner)"
            )
        }

        Err(e) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (outer)"
            )
        }
    }
}

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("submission-gateway", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let server = Application::build(cfg).await?;
    tracing::info!(port = server.get_port(), "listening");

    let server_thread = tokio::spawn(server.run_until_stopped());
    report_exit("API", server_thread.await);

    Ok(())
}
