pub mod auth;
pub mod cache;
mod client;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod pipeline;
pub mod request_context;
pub mod retry;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod transport;
pub mod types;
pub mod upload;

pub use auth::AuthService;
pub use client::ApiClient;
pub use config::{Config, Environment};
pub use errors::{ApiError, Error};
pub use session::{LogRedirect, SessionHandler};
pub use token::{Claims, UserRole};
pub use types::{AuthResponse, LoginCredentials, RequestBody, RequestConfig, RequestOptions, TokenPair};
pub use upload::{FileUpload, ProgressFn};

#[cfg(test)]
mod tests;
