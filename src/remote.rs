//! MQTT link-status listener
//!
//! Subscribes to a topic on which a remote link announces whether it is up.
//! Status changes are parsed on a background thread and handed to the host
//! loop through a channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;

use crate::error::RemoteError;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 1883;
const DEFAULT_TOPIC: &str = "sportsview/link";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

#[derive(Deserialize)]
struct JsonStatus {
    connected: bool,
}

/// Parse a status payload: JSON `{"connected": bool}` or a plain word
pub fn parse_status(payload: &str) -> Option<LinkStatus> {
    let text = payload.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<JsonStatus>(text) {
        return Some(if json.connected {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        });
    }

    match text.to_ascii_lowercase().as_str() {
        "connect" | "connected" | "on" | "1" => Some(LinkStatus::Connected),
        "disconnect" | "disconnected" | "off" | "0" => Some(LinkStatus::Disconnected),
        _ => None,
    }
}

/// Brokers drop the older session when two clients share an id
fn client_id() -> String {
    format!("sportsview-{}-{:08x}", std::process::id(), rand::random::<u32>())
}

/// MQTT client that receives link status in a background thread
pub struct LinkStatusClient {
    receiver: Receiver<LinkStatus>,
    _thread: thread::JoinHandle<()>,
}

impl LinkStatusClient {
    /// Connect and subscribe. Empty `host`/`topic` fall back to defaults.
    /// Fails immediately if the broker cannot be reached.
    pub fn new(host: &str, topic: &str) -> Result<Self, RemoteError> {
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new(client_id(), host, DEFAULT_PORT);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|source| RemoteError::Subscribe {
                topic: topic.to_string(),
                source,
            })?;

        // Poll once so an unreachable broker fails here, not later
        match connection.iter().next() {
            Some(Ok(_)) => {}
            Some(Err(source)) => {
                return Err(RemoteError::Connect {
                    host: host.to_string(),
                    port: DEFAULT_PORT,
                    source,
                });
            }
            None => {
                return Err(RemoteError::Closed {
                    host: host.to_string(),
                    port: DEFAULT_PORT,
                });
            }
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();
        let handle = thread::spawn(move || {
            // Client must outlive the event loop or the connection drops
            let _client = client;
            status_loop(connection, sender, &topic_owned);
        });

        info!("MQTT: connected to {}:{}, subscribed to '{}'", host, DEFAULT_PORT, topic);

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    /// Latest status received since the last poll (non-blocking)
    pub fn poll(&self) -> Option<LinkStatus> {
        self.receiver.try_iter().last()
    }

    pub fn default_host() -> &'static str {
        DEFAULT_HOST
    }

    pub fn default_topic() -> &'static str {
        DEFAULT_TOPIC
    }
}

fn status_loop(mut connection: Connection, sender: Sender<LinkStatus>, topic: &str) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                let Ok(text) = std::str::from_utf8(&publish.payload) else {
                    warn!("MQTT: non-UTF-8 payload on '{}'", topic);
                    continue;
                };
                match parse_status(text) {
                    Some(status) => {
                        if sender.send(status).is_err() {
                            // Host gone
                            break;
                        }
                    }
                    None => warn!("MQTT: unrecognized status '{}'", text.trim()),
                }
            }
            Ok(_) => {}
            Err(e) => {
                // rumqttc reconnects on the next iteration
                warn!("MQTT error: {}", e);
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}
