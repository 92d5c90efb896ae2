//! # Quasar App
//!
//! Headless runner for Quasar scenes: parses command line arguments, loads a
//! RON config, installs the logger and drives a [`Scene`](quasar_scene::Scene)
//! frame by frame.
//!
//! ## Overview
//!
//! - [`AppHandler`] - Trait for populating the scene and observing frames
//! - [`AppArgs`] - Trait for parsing command line arguments
//! - [`RuntimeConfig`] - RON-loaded frame count, timestep, log filter and
//!   scene settings
//! - [`App`] - The frame loop
//!
//! ## Example
//!
//! ```ignore
//! use quasar_app::{App, AppArgs, AppContext, AppHandler, DefaultAppArgs};
//!
//! struct MyApp;
//!
//! impl AppHandler for MyApp {
//!     fn on_init(&mut self, ctx: &mut AppContext) {
//!         ctx.scene_mut().create_entity("Player");
//!     }
//! }
//!
//! fn main() {
//!     let args = DefaultAppArgs::parse();
//!     if let Err(err) = App::run(MyApp, args) {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

mod app;
mod args;
mod config;
mod context;
mod handler;

pub use app::{App, FrameStats, RunReport};
pub use args::{AppArgs, DefaultAppArgs};
pub use config::{ConfigError, RuntimeConfig};
pub use context::AppContext;
pub use handler::AppHandler;

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the runner banner. Called by [`App::run`] after the logger is
/// installed.
pub fn init() {
    log::info!("Quasar App v{} initialized", VERSION);
}
