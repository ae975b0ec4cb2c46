pub mod anchor;
pub mod config;
pub mod engine;
pub mod error;
pub mod mesh;
pub mod plane;
pub mod pose;
pub mod raycast;
pub mod scene;
pub mod session;
pub mod telemetry;
pub mod visual;

pub use config::{ArConfig, LayerRegistry, PlaneStyle};
pub use engine::{ArRuntime, ArWorld};
pub use error::{ArError, ArResult, BackendError, ConfigError};
pub use session::{Session, SessionMode, SessionStatus};

/// Runs a simulated session with default settings for the configured number of frames.
pub fn run() -> ArResult<()> {
    let mut runtime = ArRuntime::new(ArConfig::simulated(), &LayerRegistry::with_defaults(), None)?;
    runtime.run()?;
    runtime.shutdown();
    Ok(())
}
