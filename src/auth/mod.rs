//! Authentication: JWT sessions for the interactive surface, hashed
//! API keys for the public API, and the middleware gluing both onto
//! the router.

pub mod api_key;
pub mod jwt;
pub mod middleware;

pub use api_key::{ApiKeyService, CreatedApiKey};
pub use jwt::{Claims, JwtService};
pub use middleware::{
    admin_middleware, api_key_only_middleware, auth_middleware, ApiKeyIdentity, AuthenticatedUser,
};
