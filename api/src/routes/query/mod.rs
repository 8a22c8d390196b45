pub mod prompt;
pub mod query_route;
