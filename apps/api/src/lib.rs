//! CV analysis service: normalizes an uploaded résumé and runs a schema-constrained
//! model extraction that yields a recruiting dossier or a typed failure.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod normalizer;
pub mod routes;
pub mod state;
