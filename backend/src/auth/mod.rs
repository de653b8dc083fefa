//! Authentication for Firebase ID tokens.
//!
//! Tokens are verified as RS256 JWTs against the issuer's published JWKS;
//! the `sub` claim is the stable account id for the credit ledger.

mod jwks;

pub use jwks::{AuthError, AuthUser, JwksClient};
