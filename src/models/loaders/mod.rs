pub mod toml_loader;

pub use toml_loader::{load_field_definitions, merge_field_file, parse_field_definitions};
