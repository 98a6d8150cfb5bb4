use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::ResamplerConfig;
use crate::engine::KernelConfig;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resampler: ResamplerConfig,
    #[serde(default)]
    pub kernel: KernelConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub min_mos: Option<f64>,
    #[serde(default)]
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    #[serde(default)]
    pub distance: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            distance: false,
        }
    }
}

fn default_format() -> OutputFormat { OutputFormat::Text }

impl GateConfig {
    pub fn passes(&self, distance: f64, mos: f64) -> bool {
        self.min_mos.map_or(true, |min| mos >= min)
            && self.max_distance.map_or(true, |max| distance <= max)
    }
}

pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("zimtohrli.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("zimtohrli").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("zimtohrli").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Invalid config {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.output.distance);
        assert_eq!(config.resampler.sinc_len, 256);
        assert_eq!(config.kernel.nsim.warp_window, 50);
        assert!(config.gate.min_mos.is_none());
    }

    #[test]
    fn loads_sections_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zimtohrli.toml");
        std::fs::write(
            &path,
            r#"
[resampler]
sinc_len = 128
f_cutoff = 0.9

[kernel.nsim]
warp_window = 20

[gate]
min_mos = 3.5

[output]
format = "json"
distance = true
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.resampler.sinc_len, 128);
        assert_eq!(config.resampler.oversampling_factor, 256);
        assert_eq!(config.kernel.nsim.warp_window, 20);
        assert_eq!(config.kernel.nsim.time_window, 8);
        assert_eq!(config.gate.min_mos, Some(3.5));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.distance);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[gate\nmin_mos = ").unwrap();
        assert!(load_config(&path).is_none());
    }

    #[test]
    fn gate_checks_both_thresholds() {
        let gate = GateConfig {
            min_mos: Some(3.0),
            max_distance: Some(0.02),
        };
        assert!(gate.passes(0.01, 3.5));
        assert!(!gate.passes(0.03, 3.5));
        assert!(!gate.passes(0.01, 2.5));
        assert!(GateConfig::default().passes(1.0, 1.0));
    }
}
