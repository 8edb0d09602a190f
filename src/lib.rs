//! Receives the two forms of a marketing site (newsletter sign-up and contact
//! enquiry) and hands them to the providers that act on them: a Mailchimp
//! audience and an SMTP relay.
//!
//! API endpoints:
//! `/health_check` (GET)
//! `/newsletter-subscribe` (POST)
//! `/send-mail` (POST)

pub mod configuration;
pub mod delivery;
pub mod domain;
pub mod email_client;
pub mod mailing_list;
pub mod routes;
pub mod startup;
pub mod telemetry;
