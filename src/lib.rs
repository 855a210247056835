mod app;
mod config;
pub mod dispatch;
pub mod domain;
pub mod email_client;
mod error;
pub mod rates;
pub mod registry;
mod routes;
pub mod telemetry;

pub use self::{
    app::{App, Server},
    config::{Config, ConfigBuilder, Error as ConfigError},
};

pub(crate) use self::error::Error;
