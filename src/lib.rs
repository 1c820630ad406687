// Callsmith - synthetic function-calling dataset pipeline
// Library exports

pub mod config;
pub mod errors;
pub mod functions; // Signature / call parsing, tool schemas, coercion
pub mod pipeline; // Stage drivers and run bookkeeping
pub mod providers; // Completion endpoint client
pub mod text; // Templates and tag extraction
