//! Real-time audio streaming via cpal.
//!
//! Devices are addressed by index, exact name or a case-insensitive name
//! fragment. Streams run `f32` buffers and block the calling thread until the
//! stop flag is cleared.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

use crate::{Error, Result};

/// Rate reported when a device has no usable default configuration.
const FALLBACK_RATE: u32 = 44_100;

/// Side of a device a lookup or stream is concerned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Capture.
    Input,
    /// Playback.
    Output,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// A device as shown to users.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Name reported by the host.
    pub name: String,
    /// Can capture.
    pub is_input: bool,
    /// Can play.
    pub is_output: bool,
    /// Rate of the device's default configuration.
    pub default_sample_rate: u32,
}

/// Stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Callback buffer size in frames; `None` lets the host choose.
    pub buffer_size: Option<u32>,
    /// Input device name or index (uses default if `None`).
    pub input_device: Option<String>,
    /// Output device name or index (uses default if `None`).
    pub output_device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: FALLBACK_RATE,
            buffer_size: None,
            input_device: None,
            output_device: None,
        }
    }
}

// cpal 0.17 reports names through `description()`.
fn device_name(device: &Device) -> Option<String> {
    device.description().ok().map(|d| d.name().to_string())
}

fn describe(device: &Device, direction: Direction) -> Option<AudioDevice> {
    let name = device_name(device)?;
    let input = device.default_input_config();
    let output = device.default_output_config();
    let default_sample_rate = match direction {
        Direction::Input => input.as_ref().map(|c| c.sample_rate()),
        Direction::Output => output.as_ref().map(|c| c.sample_rate()),
    }
    .unwrap_or(FALLBACK_RATE);
    Some(AudioDevice {
        name,
        is_input: direction == Direction::Input || input.is_ok(),
        is_output: direction == Direction::Output || output.is_ok(),
        default_sample_rate,
    })
}

fn host_devices(host: &Host, direction: Direction) -> Result<Vec<Device>> {
    let devices = match direction {
        Direction::Input => host.input_devices().map(Iterator::collect),
        Direction::Output => host.output_devices().map(Iterator::collect),
    };
    devices.map_err(|e| Error::Stream(e.to_string()))
}

/// Lists every named device once, capture devices first.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut found: Vec<AudioDevice> = Vec::new();
    for direction in [Direction::Input, Direction::Output] {
        let devices = match host_devices(&host, direction) {
            Ok(devices) => devices,
            Err(e) => {
                tracing::debug!(direction = direction.label(), error = %e, "device enumeration failed");
                continue;
            }
        };
        for info in devices.iter().filter_map(|d| describe(d, direction)) {
            if !found.iter().any(|d| d.name == info.name) {
                found.push(info);
            }
        }
    }

    tracing::debug!(
        host = host.id().name(),
        count = found.len(),
        "devices enumerated"
    );
    Ok(found)
}

/// Default capture and playback devices, if the host has them.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();
    let input = host
        .default_input_device()
        .and_then(|d| describe(&d, Direction::Input));
    let output = host
        .default_output_device()
        .and_then(|d| describe(&d, Direction::Output));
    Ok((input, output))
}

/// Finds a device by index, exact name or name fragment.
pub fn find_device(direction: Direction, name_or_index: &str) -> Result<AudioDevice> {
    let host = cpal::default_host();
    let device = lookup(&host, direction, name_or_index)?;
    describe(&device, direction)
        .ok_or_else(|| Error::DeviceNotFound(format!("unnamed {} device", direction.label())))
}

/// Live cpal stream running a callback until stopped.
///
/// The stream starts in the running state. [`AudioStream::stop_handle`]
/// returns a flag that any thread (a Ctrl+C handler, a timer) can clear to
/// make the blocking `run_*` call return.
pub struct AudioStream {
    host: Host,
    output_device: Device,
    config: StreamConfig,
    running: Arc<AtomicBool>,
    streams: Vec<Stream>,
}

impl AudioStream {
    /// Opens the configured output device. Input devices are opened by
    /// [`AudioStream::run_duplex`].
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();
        let output_device = match &config.output_device {
            Some(name) => lookup(&host, Direction::Output, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };

        tracing::info!(
            host = host.id().name(),
            output = %device_name(&output_device).unwrap_or_default(),
            sample_rate = config.sample_rate,
            "audio stream opened"
        );

        Ok(Self {
            host,
            output_device,
            config,
            running: Arc::new(AtomicBool::new(true)),
            streams: Vec::new(),
        })
    }

    /// Get the configured sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Get the output device channel count.
    pub fn output_channels(&self) -> u16 {
        self.output_device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2)
    }

    /// Flag that keeps the stream running while set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Stop the audio stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the stream is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stream_config(&self, channels: u16) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels,
            sample_rate: self.config.sample_rate,
            buffer_size: self
                .config
                .buffer_size
                .map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
        }
    }

    /// Run an output-only stream.
    ///
    /// `generate` receives interleaved buffers with
    /// [`AudioStream::output_channels`] channels. Blocks until stopped.
    pub fn run_output<F>(&mut self, mut generate: F) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let config = self.stream_config(self.output_channels());
        let running = Arc::clone(&self.running);
        let output_stream = self
            .output_device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if running.load(Ordering::Relaxed) {
                        generate(data);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(channels = config.channels, "output stream started");
        self.streams.push(output_stream);
        self.block_until_stopped();
        Ok(())
    }

    /// Run a duplex stream: captured input is handed to `process` together
    /// with the output buffer to fill.
    ///
    /// `process` receives `(input, input_channels, output, output_channels)`
    /// with interleaved buffers. Input is forwarded through a small bounded
    /// queue; when the queue is full captured audio is dropped. Blocks until
    /// stopped.
    pub fn run_duplex<F>(&mut self, mut process: F) -> Result<()>
    where
        F: FnMut(&[f32], usize, &mut [f32], usize) + Send + 'static,
    {
        use std::sync::mpsc;

        let input_device = match &self.config.input_device {
            Some(name) => lookup(&self.host, Direction::Input, name)?,
            None => self.host.default_input_device().ok_or(Error::NoDevice)?,
        };
        let input_channels = input_device
            .default_input_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .channels();
        let output_channels = self.output_channels();

        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(4);

        let input_running = Arc::clone(&self.running);
        let input_stream = input_device
            .build_input_stream(
                &self.stream_config(input_channels),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if input_running.load(Ordering::Relaxed) {
                        let _ = tx.try_send(data.to_vec());
                    }
                },
                |err| tracing::error!(%err, "input stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        let output_running = Arc::clone(&self.running);
        let in_ch = usize::from(input_channels);
        let out_ch = usize::from(output_channels);
        let mut pending: Vec<f32> = Vec::new();
        let output_stream = self
            .output_device
            .build_output_stream(
                &self.stream_config(output_channels),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !output_running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    while let Ok(samples) = rx.try_recv() {
                        pending.extend(samples);
                    }
                    let available = pending.len() / in_ch * in_ch;
                    process(&pending[..available], in_ch, data, out_ch);
                    pending.drain(..available);
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        input_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            input_channels,
            output_channels,
            "duplex stream started"
        );

        self.streams.push(input_stream);
        self.streams.push(output_stream);
        self.block_until_stopped();
        Ok(())
    }

    fn block_until_stopped(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(50));
        }
        self.streams.clear();
        tracing::info!("audio stream stopped");
    }
}

fn lookup(host: &Host, direction: Direction, name_or_index: &str) -> Result<Device> {
    pick_device(&host_devices(host, direction)?, direction, name_or_index)
}

fn pick_device(devices: &[Device], direction: Direction, query: &str) -> Result<Device> {
    let kind = direction.label();
    if let Ok(index) = query.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "{kind} device #{index} ({} available)",
                devices.len()
            ))
        });
    }

    let named: Vec<(&Device, String)> = devices
        .iter()
        .filter_map(|d| device_name(d).map(|n| (d, n)))
        .collect();
    if let Some((device, _)) = named.iter().find(|(_, n)| n == query) {
        return Ok((*device).clone());
    }

    let needle = query.to_lowercase();
    let hits: Vec<&(&Device, String)> = named
        .iter()
        .filter(|(_, n)| n.to_lowercase().contains(&needle))
        .collect();
    match hits.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no {kind} device matching '{query}'"
        ))),
        [(device, _)] => Ok((*device).clone()),
        [(device, first), ..] => {
            tracing::warn!(
                search = query,
                kind,
                using = %first,
                matches = hits.len(),
                "several devices match, using the first"
            );
            Ok((*device).clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, FALLBACK_RATE);
        assert!(config.buffer_size.is_none());
        assert!(config.input_device.is_none());
    }

    #[test]
    fn list_devices_does_not_panic() {
        // Device availability depends on the machine.
        assert!(list_devices().is_ok());
    }

    #[test]
    fn empty_list_lookup_fails() {
        assert!(matches!(
            pick_device(&[], Direction::Output, "0"),
            Err(Error::DeviceNotFound(_))
        ));
        assert!(matches!(
            pick_device(&[], Direction::Input, "usb"),
            Err(Error::DeviceNotFound(_))
        ));
    }
}
