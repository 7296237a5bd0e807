pub mod guide_service;
pub mod ingest_service;
