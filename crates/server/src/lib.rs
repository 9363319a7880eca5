pub mod errors;
pub mod middleware;
pub mod observability;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod validator;

pub use routes::{build_router, AppState};
pub use startup::{build_app, run};
