//! Authentication and authorization module

pub mod codec;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use gate::{
    authorize, extract_token, get_role, require_admin, require_admin_or_director, require_auth,
    require_role, Principal, Role,
};
pub use jwt::{Claims, JwtService};
pub use middleware::{jwt_auth_middleware, AdminOnly, AdminOrDirector};
pub use password::{PasswordHasher, PasswordVerification, StoredCredential};
