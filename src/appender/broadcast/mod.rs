//! Socket hub: fans every accepted event out to all connected TCP clients.
//!
//! Nothing is buffered for clients that are not connected yet, and events
//! appended while nobody listens are dropped.

mod client;
mod server;
pub mod wire;

use super::{AppendEngine, AppenderError, AppenderSkeleton, ConfigError, Layout, options};
use crate::domain::LoggingEvent;
use crate::net;
use server::{HubServer, ServerSettings};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_PORT: u16 = 4560;
const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(1000);

pub struct BroadcastHub {
    port: u16,
    bind_address: IpAddr,
    location_info: bool,
    client_queue_capacity: usize,
    shutdown_grace: Duration,
    server: Option<HubServer>,
}

impl BroadcastHub {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn with_bind_address(mut self, address: IpAddr) -> Self {
        self.bind_address = address;
        self
    }

    pub fn with_location_info(mut self, location_info: bool) -> Self {
        self.location_info = location_info;
        self
    }

    pub fn with_client_queue_capacity(mut self, capacity: usize) -> Self {
        self.client_queue_capacity = capacity;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn location_info(&self) -> bool {
        self.location_info
    }

    pub fn client_queue_capacity(&self) -> usize {
        self.client_queue_capacity
    }

    fn settings(&self) -> ServerSettings {
        ServerSettings {
            bind: SocketAddr::new(self.bind_address, self.port),
            client_queue_capacity: self.client_queue_capacity,
            shutdown_grace: self.shutdown_grace,
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            location_info: false,
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            server: None,
        }
    }
}

impl AppendEngine for BroadcastHub {
    fn requires_layout(&self) -> bool {
        false
    }

    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        if option.eq_ignore_ascii_case("Port") {
            self.port = options::to_u16(option, value)?;
        } else if option.eq_ignore_ascii_case("BindAddress") {
            self.bind_address = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_option(option, value, "not an IP address"))?;
        } else if option.eq_ignore_ascii_case("LocationInfo") {
            self.location_info = options::to_bool(option, value)?;
        } else if option.eq_ignore_ascii_case("ClientQueueCapacity") {
            let capacity = options::to_usize(option, value)?;
            if capacity == 0 {
                return Err(ConfigError::invalid_option(option, value, "must be greater than 0"));
            }
            self.client_queue_capacity = capacity;
        } else if option.eq_ignore_ascii_case("ShutdownGracePeriodMs") {
            self.shutdown_grace = Duration::from_millis(options::to_u64(option, value)?);
        }
        Ok(())
    }

    fn activate(&mut self, name: &str) -> Result<(), AppenderError> {
        if self.client_queue_capacity == 0 {
            return Err(ConfigError::invalid_option("ClientQueueCapacity", "0", "must be greater than 0").into());
        }

        let server = HubServer::start(name, self.settings())?;
        let host = net::local_host_name();
        info!(
            appender = %name,
            host = host.as_deref().unwrap_or("unknown"),
            addr = %server.local_addr(),
            "broadcast hub listening"
        );
        self.server = Some(server);
        Ok(())
    }

    fn append(&mut self, event: &LoggingEvent, _layout: Option<&dyn Layout>) -> Result<(), AppenderError> {
        let Some(server) = self.server.as_mut() else {
            return Ok(());
        };

        if server.client_count() == 0 {
            return Ok(());
        }

        let frame = wire::encode_event(event, self.location_info)?;
        server.broadcast(&frame);
        Ok(())
    }

    fn release(&mut self, _name: &str) {
        // Dropping the server joins the hub thread.
        self.server = None;
    }
}

impl AppenderSkeleton<BroadcastHub> {
    /// Address actually bound, which differs from the configured one for port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.with_engine(|hub| hub.server.as_ref().map(HubServer::local_addr))
    }

    pub fn connected_clients(&self) -> usize {
        self.with_engine(|hub| hub.server.as_mut().map_or(0, HubServer::client_count))
    }
}
