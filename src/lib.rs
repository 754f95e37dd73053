pub mod agent;
pub mod app_state;
pub mod config;
pub mod documents;
pub mod extract;
pub mod fetcher;
pub mod health;
pub mod llm;
pub mod observability;
pub mod routes;
