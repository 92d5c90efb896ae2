//! Command line arguments trait and default implementation.
//!
//! Uses clap for parsing, with help text (`--help`) and validation of
//! numeric flags.

use std::path::{Path, PathBuf};

/// Trait for parsing command line arguments.
///
/// Every method has a default, so custom argument types only override the
/// options they care about. Values returned here take precedence over the
/// config file.
///
/// # Example
///
/// ```ignore
/// use quasar_app::AppArgs;
///
/// struct BenchArgs;
///
/// impl AppArgs for BenchArgs {
///     fn parse() -> Self {
///         BenchArgs
///     }
///
///     fn max_frames(&self) -> Option<u64> {
///         Some(1_000)
///     }
/// }
/// ```
pub trait AppArgs: Sized {
    /// Parse command line arguments.
    fn parse() -> Self;

    /// RON file with a [`RuntimeConfig`](crate::RuntimeConfig).
    ///
    /// Default: `None` (built-in defaults)
    fn config_path(&self) -> Option<&Path> {
        None
    }

    /// Number of frames to run before exiting.
    ///
    /// Default: `None` (use the config value)
    fn max_frames(&self) -> Option<u64> {
        None
    }

    /// Seconds of simulated time per frame.
    ///
    /// Default: `None` (use the config value)
    fn timestep(&self) -> Option<f32> {
        None
    }

    /// `env_logger` filter used when `RUST_LOG` is not set.
    ///
    /// Default: `None` (use the config value, then `info`)
    fn log_filter(&self) -> Option<&str> {
        None
    }

    /// Name given to the scene.
    ///
    /// Default: "Sandbox"
    fn scene_name(&self) -> &str {
        "Sandbox"
    }
}

/// Default command line arguments implementation.
///
/// # Examples
///
/// ```bash
/// # Show help
/// ./quasar-sandbox --help
///
/// # Run 300 frames with a config file
/// ./quasar-sandbox --config sandbox.ron --max-frames 300
///
/// # Slow motion with verbose physics logs
/// ./quasar-sandbox --timestep 0.004 --log quasar_scene=debug
/// ```
#[derive(Debug, Clone)]
pub struct DefaultAppArgs {
    config: Option<PathBuf>,
    max_frames: Option<u64>,
    timestep: Option<f32>,
    log_filter: Option<String>,
    scene_name: String,
}

impl Default for DefaultAppArgs {
    fn default() -> Self {
        Self {
            config: None,
            max_frames: None,
            timestep: None,
            log_filter: None,
            scene_name: "Sandbox".to_string(),
        }
    }
}

impl DefaultAppArgs {
    /// Set the config file path.
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = Some(path.into());
        self
    }

    /// Set the maximum number of frames.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = Some(timestep);
        self
    }

    pub fn with_scene_name(mut self, name: impl Into<String>) -> Self {
        self.scene_name = name.into();
        self
    }
}

mod native {
    use super::*;
    use clap::Parser;

    /// Quasar scene runner arguments.
    #[derive(Parser, Debug)]
    #[command(
        name = "quasar-sandbox",
        about = "Runs a Quasar scene headless for a number of frames",
        version
    )]
    pub(super) struct ClapArgs {
        /// RON config file (frames, timestep, log filter, physics settings).
        #[arg(long, value_name = "PATH")]
        pub config: Option<PathBuf>,

        /// Exit after N frames.
        #[arg(long)]
        pub max_frames: Option<u64>,

        /// Seconds of simulated time per frame.
        #[arg(long, value_parser = parse_timestep)]
        pub timestep: Option<f32>,

        /// Log filter used when RUST_LOG is unset (e.g. `debug`, `quasar_scene=trace`).
        #[arg(long = "log", value_name = "FILTER")]
        pub log_filter: Option<String>,

        /// Scene name.
        #[arg(long, default_value = "Sandbox")]
        pub scene: String,
    }

    fn parse_timestep(text: &str) -> Result<f32, String> {
        let value: f32 = text.parse().map_err(|e| format!("{e}"))?;
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(format!("timestep must be a positive number of seconds, got {value}"))
        }
    }

    impl From<ClapArgs> for DefaultAppArgs {
        fn from(args: ClapArgs) -> Self {
            Self {
                config: args.config,
                max_frames: args.max_frames,
                timestep: args.timestep,
                log_filter: args.log_filter,
                scene_name: args.scene,
            }
        }
    }
}

impl AppArgs for DefaultAppArgs {
    fn parse() -> Self {
        use clap::Parser;
        native::ClapArgs::parse().into()
    }

    fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    fn timestep(&self) -> Option<f32> {
        self.timestep
    }

    fn log_filter(&self) -> Option<&str> {
        self.log_filter.as_deref()
    }

    fn scene_name(&self) -> &str {
        &self.scene_name
    }
}

#[cfg(test)]
mod tests {
    use super::native::ClapArgs;
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_leave_everything_to_config() {
        let args: DefaultAppArgs = ClapArgs::try_parse_from(["quasar-sandbox"]).unwrap().into();
        assert_eq!(args.config_path(), None);
        assert_eq!(args.max_frames(), None);
        assert_eq!(args.timestep(), None);
        assert_eq!(args.log_filter(), None);
        assert_eq!(args.scene_name(), "Sandbox");
    }

    #[test]
    fn flags_are_parsed() {
        let args: DefaultAppArgs = ClapArgs::try_parse_from([
            "quasar-sandbox",
            "--config",
            "sandbox.ron",
            "--max-frames",
            "120",
            "--timestep",
            "0.01",
            "--log",
            "debug",
            "--scene",
            "Arena",
        ])
        .unwrap()
        .into();
        assert_eq!(args.config_path(), Some(Path::new("sandbox.ron")));
        assert_eq!(args.max_frames(), Some(120));
        assert_eq!(args.timestep(), Some(0.01));
        assert_eq!(args.log_filter(), Some("debug"));
        assert_eq!(args.scene_name(), "Arena");
    }

    #[test]
    fn non_positive_timestep_is_rejected() {
        assert!(ClapArgs::try_parse_from(["quasar-sandbox", "--timestep", "0"]).is_err());
        assert!(ClapArgs::try_parse_from(["quasar-sandbox", "--timestep", "-1"]).is_err());
    }

    #[test]
    fn builder_sets_values() {
        let args = DefaultAppArgs::default()
            .with_max_frames(10)
            .with_timestep(0.5)
            .with_scene_name("Test");
        assert_eq!(args.max_frames(), Some(10));
        assert_eq!(args.timestep(), Some(0.5));
        assert_eq!(args.scene_name(), "Test");
    }
}
