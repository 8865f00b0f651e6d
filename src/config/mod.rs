//! Configuration management for waylogo
//!
//! Settings are compiled-in defaults that may be overridden by a TOML file
//! and then by command line flags. The file is optional; a missing or
//! broken file falls back to the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

/// Bytes per pixel of the fixed ARGB8888 buffer format
pub const BYTES_PER_PIXEL: u32 = 4;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LogoConfig {
    /// Which display server to talk to
    #[serde(default)]
    pub display: DisplayConfig,

    /// Window geometry and title
    #[serde(default)]
    pub window: WindowConfig,

    /// Where the raw pixel data lives
    #[serde(default)]
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Socket name under `$XDG_RUNTIME_DIR`, or an absolute socket path
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width (pixels)
    pub width: u32,

    /// Window height (pixels)
    pub height: u32,

    /// Toplevel title
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    /// Text file with one `R:G:B:A` record per pixel
    pub pixel_source: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            endpoint: "wayland-1".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 288,
            height: 288,
            title: "Wayland Logo".to_string(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            pixel_source: PathBuf::from("./img.d/logo.dat"),
        }
    }
}

impl WindowConfig {
    /// Row length in bytes
    pub fn stride(&self) -> u32 {
        BYTES_PER_PIXEL * self.width
    }

    /// Size of the single buffer, which is also the pool size
    pub fn buffer_len(&self) -> usize {
        BYTES_PER_PIXEL as usize * self.width as usize * self.height as usize
    }

    /// Number of pixel records the source must provide
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl LogoConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_home(path.as_ref())?;

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: LogoConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.display.endpoint.trim().is_empty() {
            anyhow::bail!("Invalid endpoint: must not be empty");
        }

        if self.window.width == 0 || self.window.height == 0 {
            anyhow::bail!(
                "Invalid window size {}x{}: both dimensions must be positive",
                self.window.width,
                self.window.height
            );
        }

        // Pool size and stride travel as i32 on the wire
        if self.window.buffer_len() > i32::MAX as usize {
            anyhow::bail!(
                "Invalid window size {}x{}: buffer exceeds {} bytes",
                self.window.width,
                self.window.height,
                i32::MAX
            );
        }

        Ok(())
    }
}

/// Whether a [`LogoConfig::load`] failure only means there is no file
///
/// A file that exists but does not parse or validate returns `false`.
pub fn is_missing_file(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}

/// Expand a leading `~` to `$HOME`
fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Ok(Path::new(&home).join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}
