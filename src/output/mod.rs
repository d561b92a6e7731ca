//! Result serialization

mod json;

pub use json::{to_json_pretty, write_to_file, write_to_stdout};
