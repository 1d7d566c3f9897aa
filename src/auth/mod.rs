pub mod claims;
pub mod context;
pub mod middleware;
pub mod tokens;

pub use claims::{Claims, Rol};
pub use context::AuthContext;
pub use middleware::{RequireAdmin, RequireAuth};
pub use tokens::TokenVerifier;
