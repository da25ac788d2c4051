//! HTTP route handlers

pub mod api_keys;
pub mod catalog;
pub mod generate;
pub mod generations;
pub mod health;
pub mod payments;
pub mod tokens;
pub mod users;

pub use api_keys::create_api_key_routes;
pub use catalog::create_catalog_routes;
pub use generate::{create_generate_routes, create_interactive_routes};
pub use generations::create_generation_routes;
pub use health::create_health_routes;
pub use payments::{create_admin_payment_routes, create_payment_routes};
pub use tokens::create_token_routes;
pub use users::create_admin_user_routes;
