//! Contract model and boundary validation.
//!
//! Contracts arrive as YAML or JSON, are checked against an embedded JSON
//! Schema, then deserialized into explicit types. Every engine in this
//! workspace reads contracts only through these types.

mod parser;
mod schema;

pub use parser::{
    Classification, Contract, ContractError, DatasetInfo, FieldSpec, Governance, QualityRules,
};
pub use schema::{validate_contract_schema, SchemaError};
