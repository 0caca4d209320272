use embassy_time::Duration;

/// Maximum length of a fully-qualified topic
pub const MAX_TOPIC_LEN: usize = 128;

/// Maximum length of a payload kept by the link (queued or deferred)
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// Maximum length of an application state document
pub const MAX_STATE_LEN: usize = 512;

/// Messages kept while the session is down
pub const QUEUE_CAPACITY: usize = 2;

/// Publish requests a handler can make during a single dispatch
pub const DEFERRED_CAPACITY: usize = 4;

pub const MAX_SUBSCRIPTIONS: usize = 8;
pub const MAX_ENTITIES: usize = 16;

pub const DEFAULT_MANUFACTURER: &str = "MyrtIO";
pub const DEFAULT_MODEL: &str = "Pico W Link";
pub const DEFAULT_DEVICE_NAME: &str = "MyrtIO Generic Device";
pub const SW_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for WiFi association
#[derive(Debug, Clone, Copy)]
pub struct WifiConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

impl<'a> WifiConfig<'a> {
    pub const fn new(ssid: &'a str, password: &'a str) -> Self {
        Self { ssid, password }
    }
}

/// Broker endpoint and session parameters
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub keep_alive: Duration,
}

impl<'a> BrokerConfig<'a> {
    pub const fn new(host: &'a str) -> Self {
        Self {
            host,
            port: 1883,
            username: None,
            password: None,
            keep_alive: Duration::from_secs(1800),
        }
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn with_credentials(mut self, username: &'a str, password: &'a str) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

/// Physical unit description used in discovery documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo<'a> {
    pub name: &'a str,
    pub manufacturer: &'a str,
    pub model: &'a str,
    pub sw_version: &'a str,
}

impl<'a> DeviceInfo<'a> {
    pub const fn new(name: &'a str) -> Self {
        Self {
            name,
            manufacturer: DEFAULT_MANUFACTURER,
            model: DEFAULT_MODEL,
            sw_version: SW_VERSION,
        }
    }

    #[must_use]
    pub const fn with_manufacturer(mut self, manufacturer: &'a str) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    #[must_use]
    pub const fn with_model(mut self, model: &'a str) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_sw_version(mut self, sw_version: &'a str) -> Self {
        self.sw_version = sw_version;
        self
    }
}

impl Default for DeviceInfo<'_> {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_NAME)
    }
}

/// Timings and thresholds of the link supervisor
#[derive(Debug, Clone, Copy)]
pub struct LinkTimings {
    /// Watchdog tick period
    pub watchdog_period: Duration,
    /// Faults tolerated before the device is restarted
    pub fault_threshold: u32,
    /// Status polls before WiFi association is declared failed
    pub association_polls: u32,
    /// Interval between two association polls
    pub association_poll_interval: Duration,
    /// Indicator blink rate while associating
    pub blink_hz: u32,
    /// How long the indicator is lit at start-up
    pub self_test: Duration,
}

impl LinkTimings {
    pub const fn new() -> Self {
        Self {
            watchdog_period: Duration::from_millis(2500),
            fault_threshold: 10,
            association_polls: 30,
            association_poll_interval: Duration::from_secs(1),
            blink_hz: 3,
            self_test: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub const fn with_self_test(mut self, self_test: Duration) -> Self {
        self.self_test = self_test;
        self
    }

    #[must_use]
    pub const fn with_association_polls(mut self, polls: u32) -> Self {
        self.association_polls = polls;
        self
    }
}

impl Default for LinkTimings {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the connection manager needs to bring the device online
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig<'a> {
    pub wifi: WifiConfig<'a>,
    pub broker: BrokerConfig<'a>,
    pub device: DeviceInfo<'a>,
    pub timings: LinkTimings,
}

impl<'a> LinkConfig<'a> {
    pub const fn new(wifi: WifiConfig<'a>, broker: BrokerConfig<'a>) -> Self {
        Self {
            wifi,
            broker,
            device: DeviceInfo::new(DEFAULT_DEVICE_NAME),
            timings: LinkTimings::new(),
        }
    }

    #[must_use]
    pub const fn with_device(mut self, device: DeviceInfo<'a>) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub const fn with_timings(mut self, timings: LinkTimings) -> Self {
        self.timings = timings;
        self
    }
}
