use crate::servo::ServoConfig;

const SAMPLES: u32 = 5;
const SERVER_PORT: u16 = 8084;

/// Settle delays. Modem waits stand in for acknowledgements, so they must
/// cover the slowest expected response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub boot_settle_ms: u32,
    pub mode_ms: u32,
    pub join_ms: u32,
    pub mux_ms: u32,
    pub tcp_open_ms: u32,
    pub send_request_ms: u32,
    pub payload_ms: u32,
    /// Wait for the `>` prompt after `AT+CIPSEND`.
    pub report_prompt_ms: u32,
    pub report_data_ms: u32,
    /// Lets the rest of an inbound line arrive before it is read.
    pub rx_settle_us: u32,
    pub config_applied_ms: u32,
    pub move_settle_ms: u32,
    pub cycle_ms: u32,
    pub sample_interval_us: u32,
    pub indicator_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            boot_settle_ms: 2_000,
            mode_ms: 500,
            join_ms: 5_000,
            mux_ms: 1_000,
            tcp_open_ms: 1_000,
            send_request_ms: 500,
            payload_ms: 500,
            report_prompt_ms: 500,
            report_data_ms: 500,
            rx_settle_us: 62_500,
            config_applied_ms: 250,
            move_settle_ms: 250,
            cycle_ms: 500,
            sample_interval_us: 625,
            indicator_us: 500,
        }
    }
}

/// Where the modem connects to report movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub ssid: &'static str,
    pub password: &'static str,
    pub host: &'static str,
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "tile-sorter",
            password: "",
            host: "192.168.4.2",
            port: SERVER_PORT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Readings averaged per classification.
    pub samples: u32,
    /// Sweep the arm through its calibrated positions at boot.
    pub self_test: bool,
    pub timing: Timing,
    pub servo: ServoConfig,
    pub network: NetworkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            samples: SAMPLES,
            self_test: false,
            timing: Timing::default(),
            servo: ServoConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}
