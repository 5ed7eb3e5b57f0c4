//! JSON Schema export for the report format

use crate::report::ContractReport;

/// Generate JSON Schema for [`ContractReport`].
///
/// # Errors
///
/// Returns error if the schema cannot be serialized
pub fn generate_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(ContractReport);
    serde_json::to_string_pretty(&schema)
}
