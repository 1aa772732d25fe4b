mod auth;
mod case_insensitive_string_ext;
mod credentials;
mod directory;
mod error;
mod routes;
mod strategy;
mod token;
mod types;

pub use auth::*;
pub use credentials::*;
pub use directory::*;
pub use error::*;
pub use routes::*;
pub use strategy::*;
pub use token::*;
pub use types::*;
