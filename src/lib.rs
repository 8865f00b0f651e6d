//! # waylogo
//!
//! A minimal Wayland client that shows one static image. Pixel data lives in
//! a memfd shared with the compositor, so nothing but small requests crosses
//! the socket.
//!
//! ## Architecture
//!
//! - `transport`: connection and event queue (dispatch, roundtrip)
//! - `registry`: selection and binding of the required globals
//! - `shm`: memfd-backed shared memory region and buffer layout
//! - `window`: configure/ack/commit state machine for the toplevel
//! - `renderer`: pixel source parsing and the RGBA to BGRA blit
//! - `client`: protocol event handlers and the event loop
//! - `config`: TOML configuration with compiled-in defaults
//!
//! ## Usage
//!
//! ```rust,no_run
//! use waylogo::LogoConfig;
//!
//! fn main() -> Result<(), waylogo::LogoError> {
//!     let config = LogoConfig::default();
//!     waylogo::run(&config)
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod renderer;
pub mod shm;
pub mod transport;
pub mod window;

pub use client::run;
pub use config::LogoConfig;
pub use error::{LogoError, LogoResult};

/// Version information for waylogo
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
