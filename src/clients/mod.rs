pub mod qa_client;

pub use qa_client::{Citation, PaperQaClient, QaEngine, QaRequest, QaResponse, QuerySettings};
