pub mod citation_service;
pub mod result_writer;

pub use citation_service::{classify_reference, normalize_response};
pub use result_writer::ResultWriter;
