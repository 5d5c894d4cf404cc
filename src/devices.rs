//! Compute device discovery

use std::fmt;
use tokio::process::Command;
use tracing::{debug, info};

/// Where synthesis runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda { index: usize, name: String },
}

impl Device {
    pub fn is_gpu(&self) -> bool {
        matches!(self, Device::Cuda { .. })
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("CPU"),
            Device::Cuda { index, name } => write!(f, "GPU {}: {}", index, name),
        }
    }
}

/// CPU followed by every GPU `nvidia-smi` reports
pub async fn list_devices() -> Vec<Device> {
    let mut devices = vec![Device::Cpu];

    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            let gpus = parse_gpu_names(&String::from_utf8_lossy(&out.stdout));
            info!("🖥️ Found {} GPU(s)", gpus.len());
            devices.extend(gpus);
        }
        Ok(out) => debug!("nvidia-smi exited with {}", out.status),
        Err(e) => debug!("nvidia-smi not available: {}", e),
    }

    devices
}

pub fn parse_gpu_names(stdout: &str) -> Vec<Device> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(index, name)| Device::Cuda {
            index,
            name: name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gpu_names() {
        let devices = parse_gpu_names("NVIDIA GeForce RTX 3090\n\nNVIDIA A100-SXM4-40GB\n");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].to_string(), "GPU 1: NVIDIA A100-SXM4-40GB");
        assert!(devices[0].is_gpu());
        assert!(!Device::Cpu.is_gpu());
        assert_eq!(Device::default().to_string(), "CPU");
    }

    #[test]
    fn test_cpu_always_listed_first() {
        let devices = tokio_test::block_on(list_devices());
        assert_eq!(devices.first(), Some(&Device::Cpu));
        assert!(devices[1..].iter().all(Device::is_gpu));
    }
}
