pub mod core;

pub use crate::core::acquire::{
    acquire_version, Acquisition, AcquisitionReport, GameLayout, Outcome,
};
pub use crate::core::config::{AcquireConfig, AcquireSettings};
pub use crate::core::error::{AcquireError, AcquireResult, ErrorKind};
pub use crate::core::platform::{OsFamily, PlatformDescriptor};

use tracing_subscriber::EnvFilter;

/// Install structured logging, honouring `RUST_LOG` when set.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,artifact_acquire=debug")),
        )
        .init();
}
