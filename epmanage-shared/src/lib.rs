pub mod app;
pub mod auth;
pub mod envelope;
pub mod package;
pub mod privilege;
pub mod schema;
