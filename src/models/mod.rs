pub mod field;
pub mod loaders;
pub mod result;

pub use field::{FieldDefinition, FieldRegistry, DRUG_NAME_PLACEHOLDER};
pub use loaders::{load_field_definitions, merge_field_file};
pub use result::{FieldFailure, FieldMetadata, FieldOutcome, FieldResult, ResultSet};
