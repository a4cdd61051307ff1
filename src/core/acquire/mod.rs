pub mod layout;
pub mod orchestrator;

pub use layout::GameLayout;
pub use orchestrator::{acquire_version, Acquisition, AcquisitionReport, Outcome};
