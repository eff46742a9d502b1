//! Language resolution and locale-prefixed routing for the Tourealo
//! marketplace frontend.

pub mod client;
pub mod config;
pub mod detector;
pub mod edge;
pub mod i18n;
pub mod server;
pub mod settings;
pub mod signals;
