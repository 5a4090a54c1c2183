pub mod field_ctx;
pub mod field_flow;

pub use field_ctx::FieldCtx;
pub use field_flow::FieldFlow;
