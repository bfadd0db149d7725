//! Command implementations for the CU Meets CLI.

pub mod completions;
pub mod list;

pub use completions::generate_completions;
pub use list::{ListOptions, run_list};
