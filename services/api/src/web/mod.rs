pub mod middleware;
pub mod rest;
pub mod routes;
pub mod state;

// Re-export the router builder to make it easily accessible to the binary
// that starts the web server and to the integration tests.
pub use middleware::require_learner;
pub use routes::api_router;
