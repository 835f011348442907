//! Authentication
//!
//! Identity provider gateway, access token verification and the auth API.

pub mod auth_api;
pub mod identity_gateway;
pub mod token_verifier;
pub mod user_context;

pub use auth_api::{auth_router, AuthState};
pub use identity_gateway::{IdentityProvider, RegisteredUser, Session, SupabaseGateway};
pub use token_verifier::{extract_bearer_token, TokenClaims, TokenVerifier};
pub use user_context::UserContext;
