//! ESP-AT command sequencing for the WiFi modem.
//!
//! The modem is driven open-loop: each command is followed by a fixed settle
//! delay and whatever the modem answers is thrown away. Nothing checks that
//! a command was accepted, and a transport that never drains stalls the
//! caller forever. A dead link shows up as reports silently going missing.

use core::fmt::{self, Write};

use embedded_hal_async::delay::DelayNs;

use crate::color::ColorLabel;
use crate::comm::{Receiver, RxInterrupt};
use crate::config::{NetworkConfig, Timing};
use crate::error::SorterError;
use crate::sides::Side;

/// Longest command built here: `AT+CIPSTART` with a 253-byte host name.
/// `AT+CWJAP` with a 32-byte SSID and a 63-byte passphrase needs 111.
pub const MAX_COMMAND_LEN: usize = 288;

const CMD_MODE: &str = "AT+CWMODE=1\r\n";
const CMD_MUX: &str = "AT+CIPMUX=0\r\n";
/// Sent once the TCP link is up.
pub const HELLO_PAYLOAD: &str = "ON!";

pub type Command = heapless::String<MAX_COMMAND_LEN>;

/// Raw byte sink towards the modem.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Writes all of `bytes`, waiting for room as needed. No timeout.
    async fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// A command and the time the modem gets before the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub command: Command,
    pub settle_ms: u32,
}

impl Step {
    fn new(command: Command, settle_ms: u32) -> Self {
        Self { command, settle_ms }
    }
}

fn format_command(args: fmt::Arguments<'_>) -> Result<Command, SorterError> {
    let mut cmd = Command::new();
    cmd.write_fmt(args)
        .map_err(|_| SorterError::CommandTooLong(MAX_COMMAND_LEN))?;
    Ok(cmd)
}

/// `AT+CIPSEND=<len>`, announcing `len` bytes of payload.
pub fn send_request(len: usize) -> Result<Command, SorterError> {
    format_command(format_args!("AT+CIPSEND={}\r\n", len))
}

/// `MOV#<side>#<color>\r\n`
pub fn report_line(side: Side, label: ColorLabel) -> Result<Command, SorterError> {
    format_command(format_args!("MOV#{}#{}\r\n", side.as_str(), label.as_str()))
}

/// Station mode, join, single connection, TCP open, then a hello payload.
pub fn bring_up_steps(network: &NetworkConfig, timing: &Timing) -> Result<[Step; 6], SorterError> {
    Ok([
        Step::new(format_command(format_args!("{}", CMD_MODE))?, timing.mode_ms),
        Step::new(
            format_command(format_args!(
                "AT+CWJAP=\"{}\",\"{}\"\r\n",
                network.ssid, network.password
            ))?,
            timing.join_ms,
        ),
        Step::new(format_command(format_args!("{}", CMD_MUX))?, timing.mux_ms),
        Step::new(
            format_command(format_args!(
                "AT+CIPSTART=\"TCP\",\"{}\",{}\r\n",
                network.host, network.port
            ))?,
            timing.tcp_open_ms,
        ),
        Step::new(send_request(HELLO_PAYLOAD.len())?, timing.send_request_ms),
        Step::new(
            format_command(format_args!("{}", HELLO_PAYLOAD))?,
            timing.payload_ms,
        ),
    ])
}

pub struct Modem<T> {
    transport: T,
}

impl<T: Transport> Modem<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Writes `command` verbatim. A transport error is logged and dropped.
    pub async fn send(&mut self, command: &[u8]) {
        if let Err(e) = self.transport.transmit(command).await {
            log::warn!("Modem transmit failed: {:?}", e);
        }
    }

    /// Runs `steps` in order: send, wait the step's settle time, then
    /// discard whatever the modem sent back.
    pub async fn run_sequence<I, D, const N: usize>(
        &mut self,
        steps: &[Step],
        rx: &mut Receiver<'_, I, N>,
        delay: &mut D,
    ) where
        I: RxInterrupt,
        D: DelayNs,
    {
        for step in steps {
            log::debug!("AT> {:?}", step.command.as_str().trim_end());
            self.send(step.command.as_bytes()).await;
            delay.delay_ms(step.settle_ms).await;
            rx.reset();
        }
    }

    pub async fn bring_up<I, D, const N: usize>(
        &mut self,
        network: &NetworkConfig,
        timing: &Timing,
        rx: &mut Receiver<'_, I, N>,
        delay: &mut D,
    ) -> Result<(), SorterError>
    where
        I: RxInterrupt,
        D: DelayNs,
    {
        let steps = bring_up_steps(network, timing)?;
        log::info!("Connecting to {}:{}", network.host, network.port);
        self.run_sequence(&steps, rx, delay).await;
        log::info!("Modem bring-up done");
        Ok(())
    }

    /// Reports one sorted tile: a size-declaring `AT+CIPSEND`, then the line.
    pub async fn report<I, D, const N: usize>(
        &mut self,
        side: Side,
        label: ColorLabel,
        timing: &Timing,
        rx: &mut Receiver<'_, I, N>,
        delay: &mut D,
    ) -> Result<(), SorterError>
    where
        I: RxInterrupt,
        D: DelayNs,
    {
        let line = report_line(side, label)?;
        let steps = [
            Step::new(send_request(line.len())?, timing.report_prompt_ms),
            Step::new(line, timing.report_data_ms),
        ];
        self.run_sequence(&steps, rx, delay).await;
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
