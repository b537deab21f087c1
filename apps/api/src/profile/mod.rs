// Master résumé profile: model, text/PDF ingestion, and handlers.
// The profile is built once per request and read-only afterwards.

pub mod handlers;
pub mod ingest;
pub mod models;
