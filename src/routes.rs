use std::{convert::Infallible, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use warp::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    hyper::body::Bytes,
    path, Filter, Rejection, Reply,
};

use crate::{
    auth::{Auth, AuthInternal},
    case_insensitive_string_ext::CaseInsensitiveStringExt,
    error::{AuthError, Rejected},
    strategy::{AuthRequest, StrategyKind},
    types::{Token, UserIdentity},
};

/// Where a protected request carries its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCarrier {
    /// The raw token as the value of the named header.
    Header(String),
    /// `Authorization: Bearer <token>`, scheme matched case-insensitively.
    Bearer,
}

impl Default for TokenCarrier {
    fn default() -> Self {
        TokenCarrier::Header("token".into())
    }
}

impl TokenCarrier {
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        match self {
            TokenCarrier::Header(name) => headers
                .get(name.as_str())
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            TokenCarrier::Bearer => headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix_ignore_ascii_case("bearer "))
                .map(str::to_owned),
        }
    }
}

/// `POST /auth/login`
pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_login)
}

/// `GET /user`, token required.
pub fn build_user_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    path!("user")
        .and(warp::get())
        .and(with_auth(auth))
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_list)
}

pub fn with_auth(auth: &Auth) -> impl Filter<Extract = (UserIdentity,), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and(with_auth_state(auth.internal.clone()))
        .and_then(user_auth_check)
}

pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(rejected) = err.find::<Rejected>() {
        return Ok(error_reply(StatusCode::UNAUTHORIZED, &rejected.to_string()));
    }

    if let Some(auth_error) = err.find::<AuthError>() {
        warn!(error = %auth_error, "auth request failed");
        return Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "an unknown error has occurred",
        ));
    }

    Err(err)
}

fn error_reply(status: StatusCode, message: &str) -> impl Reply {
    let body = json!({ "statusCode": status.as_u16(), "message": message });
    warp::reply::with_status(warp::reply::json(&body), status)
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginQuery {
    /// A body that is not JSON, or lacks either field as a string, still goes through the
    /// password strategy, just without credentials.
    pub fn parse(body: &[u8]) -> AuthRequest {
        match serde_json::from_slice::<LoginQuery>(body) {
            Ok(LoginQuery {
                username: Some(username),
                password: Some(password),
            }) => AuthRequest::login(username, password),
            _ => AuthRequest {
                strategy: StrategyKind::Password,
                credentials: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Token,
}

async fn user_login(body: Bytes, auth: Arc<AuthInternal>) -> Result<impl Reply, Rejection> {
    let token = auth.login(LoginQuery::parse(&body)).await?;

    Ok(warp::reply::json(&LoginResponse { token }))
}

async fn user_list(_caller: UserIdentity, auth: Arc<AuthInternal>) -> Result<impl Reply, Rejection> {
    let users = auth.list_users().await?;

    Ok(warp::reply::json(&users))
}

// Pull the token out of its carrier and run the token strategy on it
async fn user_auth_check(
    headers: HeaderMap,
    auth: Arc<AuthInternal>,
) -> Result<UserIdentity, Rejection> {
    let token = auth.token_carrier.extract(&headers);

    let identity = auth.router.route(AuthRequest::protected(token)).await?;

    Ok(identity)
}

// functor that adds a reference to the internal auth state into the filter chain
fn with_auth_state(
    auth: Arc<AuthInternal>,
) -> impl Filter<Extract = (Arc<AuthInternal>,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use warp::http::HeaderValue;

    use super::*;
    use crate::{auth::AuthConfig, directory::InMemoryDirectory};

    fn auth(carrier: TokenCarrier) -> Auth {
        let directory = Arc::new(InMemoryDirectory::default_users().unwrap());
        let config = AuthConfig::new("routes test secret", directory).with_token_carrier(carrier);
        Auth::new(config).unwrap()
    }

    fn routes(
        auth: &Auth,
    ) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone + 'static {
        build_api_route_filter(auth)
            .or(build_user_route_filter(auth))
            .recover(handle_auth_errors)
    }

    async fn login(auth: &Auth, username: &str, password: &str) -> (StatusCode, Value) {
        let response = warp::test::request()
            .method("POST")
            .path("/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .reply(&routes(auth))
            .await;

        let body = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
        (response.status(), body)
    }

    #[test]
    fn header_carrier_reads_named_header() {
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("abc.def.ghi"));

        assert_eq!(
            TokenCarrier::default().extract(&headers),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(TokenCarrier::Bearer.extract(&headers), None);
    }

    #[test]
    fn bearer_carrier_strips_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bEaReR abc.def.ghi"));

        assert_eq!(
            TokenCarrier::Bearer.extract(&headers),
            Some("abc.def.ghi".to_string())
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWRtaW46YWRtaW4="));
        assert_eq!(TokenCarrier::Bearer.extract(&headers), None);
    }

    #[tokio::test]
    async fn login_returns_token() {
        let auth = auth(TokenCarrier::default());

        let (status, body) = login(&auth, "admin", "admin").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    }

    #[tokio::test]
    async fn bad_login_is_unauthorized_with_generic_message() {
        let auth = auth(TokenCarrier::default());

        let (wrong_status, wrong_body) = login(&auth, "admin", "wrong").await;
        let (unknown_status, unknown_body) = login(&auth, "nobody", "x").await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
        assert_eq!(wrong_body["message"], "incorrect username or password");
    }

    #[tokio::test]
    async fn incomplete_login_body_is_unauthorized() {
        let auth = auth(TokenCarrier::default());

        let bodies = [
            json!({}).to_string(),
            json!({ "username": "admin" }).to_string(),
            json!({ "password": "admin" }).to_string(),
            json!({ "username": "admin", "password": 42 }).to_string(),
            "not json at all".to_string(),
        ];

        for body in bodies {
            let response = warp::test::request()
                .method("POST")
                .path("/auth/login")
                .body(body.clone())
                .reply(&routes(&auth))
                .await;

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{body}");
            let reply: Value = serde_json::from_slice(response.body()).unwrap();
            assert_eq!(
                reply,
                json!({ "statusCode": 401, "message": "incorrect username or password" }),
                "{body}"
            );
        }
    }

    #[test]
    fn login_query_without_both_fields_has_no_credentials() {
        let request = LoginQuery::parse(br#"{"username":"admin"}"#);
        assert_eq!(request.strategy, StrategyKind::Password);
        assert!(request.credentials.is_none());

        let request = LoginQuery::parse(br#"{"username":"admin","password":"admin"}"#);
        assert!(request.credentials.is_some());
    }

    #[tokio::test]
    async fn user_list_requires_token() {
        let auth = auth(TokenCarrier::default());

        let response = warp::test::request()
            .method("GET")
            .path("/user")
            .reply(&routes(&auth))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "unauthorized");
    }

    #[tokio::test]
    async fn user_list_with_token_strips_passwords() {
        let auth = auth(TokenCarrier::default());
        let (_, body) = login(&auth, "admin", "admin").await;
        let token = body["token"].as_str().unwrap().to_owned();

        let response = warp::test::request()
            .method("GET")
            .path("/user")
            .header("token", token)
            .reply(&routes(&auth))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let users: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(
            users,
            json!([
                { "id": 1, "username": "admin" },
                { "id": 2, "username": "tester" },
            ])
        );
    }

    #[tokio::test]
    async fn bearer_carrier_ignores_token_header() {
        let auth = auth(TokenCarrier::Bearer);
        let (_, body) = login(&auth, "tester", "tester").await;
        let token = body["token"].as_str().unwrap().to_owned();

        let in_wrong_place = warp::test::request()
            .method("GET")
            .path("/user")
            .header("token", token.clone())
            .reply(&routes(&auth))
            .await;
        let in_right_place = warp::test::request()
            .method("GET")
            .path("/user")
            .header("authorization", format!("Bearer {token}"))
            .reply(&routes(&auth))
            .await;

        assert_eq!(in_wrong_place.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(in_right_place.status(), StatusCode::OK);
    }
}
