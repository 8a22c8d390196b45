pub mod retrieval_config;
pub mod search_hit;
