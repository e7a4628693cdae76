//! Authentication infrastructure module
//!
//! JWT issuing and validation, and the authenticator that turns a bearer
//! token into a caller identity.

mod authenticator;
mod jwt;

pub use authenticator::JwtAuthenticator;
pub use jwt::{
    IssuedToken, JwtClaims, JwtConfig, JwtGenerator, JwtService, DEFAULT_JWT_SECRET,
};
