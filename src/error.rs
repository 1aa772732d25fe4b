use warp::reject::Reject;

/// Internal failure reasons. These are logged but never shown to a caller as-is; the
/// [`StrategyRouter`](crate::StrategyRouter) collapses them into a [`Rejected`].
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("username or password incorrect")]
    CredentialInvalid,
    #[error("token could not be parsed")]
    TokenMalformed,
    #[error("token signature does not match")]
    TokenSignatureInvalid,
    #[error("token is missing required claims")]
    TokenClaimsMissing,
    #[error("token has expired")]
    TokenExpired,
    #[error("no configured strategy applies to this request")]
    StrategyNotApplicable,
    #[error("error during directory lookup")]
    DirectoryUnavailable {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("error while hashing password")]
    PasswordHashFailed {
        #[from]
        source: argon2::Error,
    },
    #[error("error while signing token")]
    TokenIssueFailed {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

impl Reject for AuthError {}

/// What a caller is told when a strategy fails.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    #[error("incorrect username or password")]
    LoginFailed,
    #[error("unauthorized")]
    Unauthorized,
}

impl Reject for Rejected {}
