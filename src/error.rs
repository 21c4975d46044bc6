//! Error types

use std::io;
use thiserror::Error;

/// Errors raised while driving a particle system
#[derive(Debug, Error)]
pub enum ParticleError {
    /// `on_update` ran before `prepare_emitting` published the particles to
    /// the view
    #[error("particle system updated before prepare_emitting")]
    NotPrepared,
}

/// Errors from loading or saving an emitter preset
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid preset JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Emitter geometry needs `[min_x, max_x, min_y, max_y]`
    #[error("emitter needs 4 values, got {0}")]
    InvalidEmitter(usize),
}

/// Errors from the MQTT link-status listener
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to subscribe to '{topic}': {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: rumqttc::ClientError,
    },

    #[error("failed to connect to MQTT broker at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: rumqttc::ConnectionError,
    },

    #[error("MQTT broker at {host}:{port} closed the connection")]
    Closed { host: String, port: u16 },
}
