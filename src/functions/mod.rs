// Function signature and call handling
//
// Everything that turns generated python-like text into structured data:
// signatures, call expressions, tool schemas and expected-value coercion.

pub mod call;
pub mod coerce;
pub mod literal;
pub mod schema;
pub mod signature;

pub use call::{call_name, parse_function_call, split_arguments};
pub use coerce::{coerce_expected, CoercionError, CoercionMode, ReturnKind};
pub use schema::{build_tool, json_schema_for_type, ToolInputSchema, ToolSchema};
pub use signature::{parse_signature, Parameter, Signature};
