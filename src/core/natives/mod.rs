pub mod extract;

pub use extract::{extract_natives, ExtractSummary};
