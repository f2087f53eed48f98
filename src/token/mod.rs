mod envelope;
mod jwt;
mod policy;
mod refresh;
mod store;

pub use envelope::{SameSite, StoredToken, TokenSnapshot};
pub use jwt::{Claims, UserRole, decode_jwt_payload};
pub use policy::RefreshPolicy;
pub use refresh::RefreshCoordinator;
pub use store::TokenStore;
