//! Background MQTT subscription delivering remote messages to the kiosk.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use rumqttc::{
    Client, ClientError, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions,
    Packet, QoS,
};

use crate::{
    communication::{Inbound, Outbox},
    config::BrokerConfig,
    error::SubscriberError,
};

/// How long shutdown waits for the network thread before leaving it behind.
const JOIN_GRACE: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Handle to the subscriber thread. Dropping it shuts the thread down.
pub struct Subscriber {
    client: Client,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Subscriber {
    /// Starts connecting in the background; failures to reach the broker are
    /// retried there and never surface here.
    pub fn spawn(config: &BrokerConfig, outbox: Outbox) -> Result<Self, SubscriberError> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.as_deref().unwrap_or_default());
        }
        let (client, connection) = Client::new(options, 10);
        let stop = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            client: client.clone(),
            topic: config.topic.clone(),
            outbox,
            stop: Arc::clone(&stop),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
        };
        let handle = thread::Builder::new()
            .name("subscriber".to_string())
            .spawn(move || worker.run(connection))?;
        info!(
            "subscriber started for {}:{} topic {}",
            config.host, config.port, config.topic
        );
        Ok(Self {
            client,
            stop,
            handle: Some(handle),
        })
    }

    /// Stops the background loop and disconnects. Waits a bounded time for the
    /// thread; idempotent.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::SeqCst);
        if let Err(err) = self.client.try_disconnect() {
            debug!("disconnect request not queued: {err}");
        }
        let deadline = Instant::now() + JOIN_GRACE;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if handle.is_finished() {
            if handle.join().is_err() {
                error!("subscriber thread panicked");
            }
            info!("subscriber stopped");
        } else {
            warn!("subscriber thread still busy after shutdown, leaving it behind");
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The one subscription the worker keeps alive. [`Client`] in production.
trait Subscribe {
    fn subscribe_to(&self, topic: &str) -> Result<(), ClientError>;
}

impl Subscribe for Client {
    fn subscribe_to(&self, topic: &str) -> Result<(), ClientError> {
        self.subscribe(topic, QoS::AtMostOnce)
    }
}

struct Worker<C = Client> {
    client: C,
    topic: String,
    outbox: Outbox,
    stop: Arc<AtomicBool>,
    reconnect_delay: Duration,
}

impl<C: Subscribe> Worker<C> {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn run(self, mut connection: Connection) {
        let mut online = false;
        for notification in connection.iter() {
            if self.stopped() {
                break;
            }
            if !self.handle(&mut online, notification) {
                debug!("kiosk gone, subscriber exiting");
                break;
            }
        }
    }

    /// Reacts to one event of the connection. Returns false once the kiosk
    /// side of the channel is gone.
    fn handle(&self, online: &mut bool, notification: Result<Event, ConnectionError>) -> bool {
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    *online = true;
                    self.on_connected()
                } else {
                    warn!("broker refused connection: {:?}", ack.code);
                    true
                }
            }
            // the broker only forwards what matches our single subscription,
            // wildcards included
            Ok(Event::Incoming(Packet::Publish(publish))) => self.on_payload(&publish.payload),
            Ok(_) => true,
            Err(err) => {
                let keep_going = if *online {
                    *online = false;
                    warn!("disconnected from broker: {err}");
                    self.outbox.send(Inbound::Disconnected)
                } else {
                    warn!("couldn't reach broker: {err}");
                    true
                };
                self.back_off();
                keep_going
            }
        }
    }

    fn on_connected(&self) -> bool {
        // subscriptions do not survive a clean-session reconnect
        if let Err(err) = self.client.subscribe_to(&self.topic) {
            warn!("couldn't subscribe to {}: {err}", self.topic);
        }
        info!("connected to broker, subscribed to {}", self.topic);
        self.outbox.send(Inbound::Connected)
    }

    fn on_payload(&self, payload: &[u8]) -> bool {
        match std::str::from_utf8(payload) {
            Ok(text) => {
                info!("message received: {text}");
                self.outbox.send(Inbound::Text(text.to_string()))
            }
            Err(err) => {
                warn!("dropping non UTF-8 message: {err}");
                true
            }
        }
    }

    fn back_off(&self) {
        let deadline = Instant::now() + self.reconnect_delay;
        while !self.stopped() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
    }
}
