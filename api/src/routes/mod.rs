pub mod health_route;
pub mod ingest_route;
pub mod query;
pub mod root_route;
pub mod sources_route;
