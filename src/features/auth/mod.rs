mod validator;

pub mod model;

pub use model::{CredentialClaim, Role};
pub use validator::JwtValidator;
