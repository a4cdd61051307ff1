pub mod classpath;

pub use classpath::{get_classpath_separator, LaunchInputs};
