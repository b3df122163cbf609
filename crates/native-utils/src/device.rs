use anyhow::Context;
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

fn get_host() -> cpal::Host {
    cpal::default_host()
}

// Picks the named device, or the host default when no name is given.
fn find_device(
    devices: impl Iterator<Item = Device>,
    default: Option<Device>,
    device_name: Option<&str>,
) -> anyhow::Result<Device> {
    let Some(target) = device_name else {
        return default.context("No default audio device available");
    };
    devices
        .into_iter()
        .find(|d| d.name().is_ok_and(|name| name == target))
        .with_context(|| format!("No audio device named '{target}'"))
}

/// Returns the named input device, or the host's default input device.
pub fn get_or_default_input(device_name: Option<&str>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());
    let inputs = host
        .input_devices()
        .context("Failed to enumerate input devices")?;
    find_device(inputs, host.default_input_device(), device_name)
}

/// Returns the named output device, or the host's default output device.
pub fn get_or_default_output(device_name: Option<&str>) -> anyhow::Result<Device> {
    let host = get_host();
    let outputs = host
        .output_devices()
        .context("Failed to enumerate output devices")?;
    find_device(outputs, host.default_output_device(), device_name)
}

fn describe(name: &str, channels: u16, sample_rate: u32, default: Option<&str>) -> String {
    let mut d = format!(" * {}({}ch, {}hz)", name, channels, sample_rate);
    if Some(name) == default {
        d.push_str(" [default]");
    }
    d
}

/// Lists input devices with their default configuration, one per line.
pub fn get_available_inputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_device = host.default_input_device().and_then(|d| d.name().ok());

    let mut device_names: Vec<String> = Vec::new();
    for in_device in host.input_devices()? {
        let Ok(d_name) = in_device.name() else {
            continue;
        };
        match in_device.default_input_config() {
            Ok(cfg) => device_names.push(describe(
                &d_name,
                cfg.channels(),
                cfg.sample_rate().0,
                default_device.as_deref(),
            )),
            Err(e) => tracing::debug!("Skipping input device {}: {}", d_name, e),
        }
    }
    Ok(device_names.join("\n"))
}

/// Lists output devices with their default configuration, one per line.
pub fn get_available_outputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_device = host.default_output_device().and_then(|d| d.name().ok());

    let mut device_names: Vec<String> = Vec::new();
    for out_device in host.output_devices()? {
        let Ok(d_name) = out_device.name() else {
            continue;
        };
        match out_device.default_output_config() {
            Ok(cfg) => device_names.push(describe(
                &d_name,
                cfg.channels(),
                cfg.sample_rate().0,
                default_device.as_deref(),
            )),
            Err(e) => tracing::debug!("Skipping output device {}: {}", d_name, e),
        }
    }
    Ok(device_names.join("\n"))
}
