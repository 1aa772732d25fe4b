use std::sync::Arc;

use crate::{
    credentials::CredentialValidator,
    directory::UserDirectory,
    error::{AuthError, Rejected},
    routes::TokenCarrier,
    strategy::{AuthRequest, PasswordStrategy, Strategy, StrategyRouter, TokenStrategy},
    token::{TokenIssuer, TokenVerifier},
    types::{Token, UserIdentity},
};

#[derive(Clone)]
pub struct AuthConfig {
    /// The secret used to sign and verify auth tokens.
    /// If the secret changes, every token issued so far stops validating.
    pub auth_token_secret: String,
    /// Where protected routes look for the token.
    pub token_carrier: TokenCarrier,
    pub directory: Arc<dyn UserDirectory>,
}

impl AuthConfig {
    pub fn new(auth_token_secret: impl Into<String>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            auth_token_secret: auth_token_secret.into(),
            token_carrier: TokenCarrier::default(),
            directory,
        }
    }

    pub fn with_token_carrier(mut self, token_carrier: TokenCarrier) -> Self {
        self.token_carrier = token_carrier;
        self
    }
}

pub(crate) struct AuthInternal {
    pub(crate) router: StrategyRouter,
    pub(crate) issuer: TokenIssuer,
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) token_carrier: TokenCarrier,
}

impl AuthInternal {
    /// Run the password strategy and, if it passes, sign a token for the user.
    pub async fn login(&self, request: AuthRequest) -> Result<Token, warp::Rejection> {
        let identity = self.router.route(request).await?;
        let token = self.issuer.issue(&identity)?;
        Ok(token)
    }

    pub async fn list_users(&self) -> Result<Vec<UserIdentity>, AuthError> {
        Ok(self.directory.list_all().await?)
    }
}

/// Shared, immutable auth state. Cheap to clone into every filter.
#[derive(Clone)]
pub struct Auth {
    pub(crate) internal: Arc<AuthInternal>,
}

impl Auth {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let secret = config.auth_token_secret.as_bytes();
        let validator = CredentialValidator::new(config.directory.clone())?;

        let router = StrategyRouter::new()
            .with(Strategy::Password(PasswordStrategy::new(validator)))
            .with(Strategy::Token(TokenStrategy::new(TokenVerifier::new(secret))));

        Ok(Self {
            internal: Arc::new(AuthInternal {
                router,
                issuer: TokenIssuer::new(secret),
                directory: config.directory,
                token_carrier: config.token_carrier,
            }),
        })
    }

    /// Authenticate a request outside of warp, e.g. from a different transport.
    pub async fn authenticate(&self, request: AuthRequest) -> Result<UserIdentity, Rejected> {
        self.internal.router.route(request).await
    }

    pub fn issue_token(&self, identity: &UserIdentity) -> Result<Token, AuthError> {
        self.internal.issuer.issue(identity)
    }
}
