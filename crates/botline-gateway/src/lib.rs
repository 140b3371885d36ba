//! WhatsApp gateway integration (Green API).
//!
//! The gateway mediates all WhatsApp traffic: it POSTs webhook notifications
//! to us for inbound messages, and we call its instance-scoped REST API to
//! send replies and manage the connection. Credentials are per bot, so every
//! client method takes an [`InstanceCredentials`].

#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod webhook;

pub use client::{Gateway, GreenApi, InstanceCredentials, InstanceState, Notification, QrResult};
pub use error::{Error, Result};
pub use webhook::{InboundText, WebhookNotification};
