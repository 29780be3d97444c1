pub mod flush_service;
pub mod health_reporter_service;
pub mod ingestion_service;
