mod requests;

use std::env;

use tracing::Level;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{
    filter::Targets, fmt::MakeWriter, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

pub(crate) use self::requests::{id_layer, trace_layer};

/// Installs the global subscriber, writing bunyan-formatted JSON lines to `sink`.
///
/// `RUST_LOG` accepts `target=level` directives. This crate and `name` log at `DEBUG` unless
/// overridden.
pub fn init<Sink>(name: impl ToString, sink: Sink)
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let name = name.to_string();

    let filter = match env::var("RUST_LOG") {
        Ok(filter) => filter.parse().expect("invalid configuration for RUST_LOG"),
        Err(_) => Targets::new()
            .with_target(env!("CARGO_PKG_NAME").replace('-', "_"), Level::DEBUG)
            .with_target(&name, Level::DEBUG),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name, sink))
        .init();
}
