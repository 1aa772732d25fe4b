use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    credentials::CredentialValidator,
    error::{AuthError, Rejected},
    token::TokenVerifier,
    types::{UserIdentity, Username},
};

/// Which strategy a request asks to be authenticated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Password,
    Token,
}

impl StrategyKind {
    fn rejection(self) -> Rejected {
        match self {
            StrategyKind::Password => Rejected::LoginFailed,
            StrategyKind::Token => Rejected::Unauthorized,
        }
    }
}

/// What the caller pulled out of the request.
pub enum Credentials {
    Password { username: Username, password: String },
    Token(String),
}

// Hand-written so passwords and tokens never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::Token(_) => f.write_str("Token(..)"),
        }
    }
}

#[derive(Debug)]
pub struct AuthRequest {
    pub strategy: StrategyKind,
    pub credentials: Option<Credentials>,
}

impl AuthRequest {
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            strategy: StrategyKind::Password,
            credentials: Some(Credentials::Password {
                username: Username(username.into()),
                password: password.into(),
            }),
        }
    }

    /// A request for a protected operation; `token` is `None` when the carrier was empty.
    pub fn protected(token: Option<String>) -> Self {
        Self {
            strategy: StrategyKind::Token,
            credentials: token.map(Credentials::Token),
        }
    }
}

#[async_trait]
pub trait Authenticate: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserIdentity, AuthError>;
}

#[derive(Clone)]
pub struct PasswordStrategy {
    validator: CredentialValidator,
}

impl PasswordStrategy {
    pub fn new(validator: CredentialValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Authenticate for PasswordStrategy {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserIdentity, AuthError> {
        match credentials {
            Credentials::Password { username, password } => {
                self.validator.validate(username, password).await
            }
            Credentials::Token(_) => Err(AuthError::StrategyNotApplicable),
        }
    }
}

#[derive(Clone)]
pub struct TokenStrategy {
    verifier: TokenVerifier,
}

impl TokenStrategy {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl Authenticate for TokenStrategy {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserIdentity, AuthError> {
        match credentials {
            Credentials::Token(token) => self.verifier.verify(token),
            Credentials::Password { .. } => Err(AuthError::StrategyNotApplicable),
        }
    }
}

#[derive(Clone)]
pub enum Strategy {
    Password(PasswordStrategy),
    Token(TokenStrategy),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Password(_) => StrategyKind::Password,
            Strategy::Token(_) => StrategyKind::Token,
        }
    }
}

#[async_trait]
impl Authenticate for Strategy {
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserIdentity, AuthError> {
        match self {
            Strategy::Password(strategy) => strategy.authenticate(credentials).await,
            Strategy::Token(strategy) => strategy.authenticate(credentials).await,
        }
    }
}

/// Runs exactly one strategy per request and reduces every failure to a [`Rejected`].
#[derive(Clone, Default)]
pub struct StrategyRouter {
    strategies: Vec<Strategy>,
}

impl StrategyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any earlier one of the same kind.
    pub fn with(mut self, strategy: Strategy) -> Self {
        self.strategies.retain(|s| s.kind() != strategy.kind());
        self.strategies.push(strategy);
        self
    }

    pub async fn route(&self, request: AuthRequest) -> Result<UserIdentity, Rejected> {
        let kind = request.strategy;

        match self.run(request).await {
            Ok(identity) => {
                if kind == StrategyKind::Password {
                    info!(user_id = identity.id.0, "login succeeded");
                } else {
                    debug!(user_id = identity.id.0, "token accepted");
                }
                Ok(identity)
            }
            Err(err @ AuthError::DirectoryUnavailable { .. }) => {
                warn!(strategy = ?kind, error = %err, "authentication backend failed");
                Err(kind.rejection())
            }
            Err(err) => {
                debug!(strategy = ?kind, reason = %err, "request rejected");
                Err(kind.rejection())
            }
        }
    }

    async fn run(&self, request: AuthRequest) -> Result<UserIdentity, AuthError> {
        let strategy = self
            .strategies
            .iter()
            .find(|s| s.kind() == request.strategy)
            .ok_or(AuthError::StrategyNotApplicable)?;
        let credentials = request
            .credentials
            .ok_or(AuthError::StrategyNotApplicable)?;

        strategy.authenticate(&credentials).await
    }
}
