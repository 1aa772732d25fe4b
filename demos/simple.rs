use std::{env, net::SocketAddr, sync::Arc};

use token_auth_for_warp::{
    build_api_route_filter, build_user_route_filter, handle_auth_errors, with_auth, Auth,
    AuthConfig, InMemoryDirectory, UserIdentity,
};
use tracing_subscriber::EnvFilter;
use warp::{path, Filter};

const DEV_SECRET: &str = "this is a really bad secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let secret = env::var("AUTH_TOKEN_SECRET").unwrap_or_else(|_| {
        tracing::warn!("AUTH_TOKEN_SECRET not set, using the development secret");
        DEV_SECRET.to_owned()
    });
    let addr: SocketAddr = env::var("AUTH_LISTEN_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:4000".to_owned())
        .parse()?;

    // admin/admin and tester/tester
    let directory = Arc::new(InMemoryDirectory::default_users()?);

    let auth = Auth::new(AuthConfig::new(secret, directory))?;

    let unsecured_homepage =
        warp::path::end().then(|| async move { warp::reply::html("hello, world!") });

    let whoami = path!("whoami")
        .and(with_auth(&auth))
        .then(|identity: UserIdentity| async move { warp::reply::json(&identity) });

    let all_routes = unsecured_homepage
        .or(whoami)
        .or(build_api_route_filter(&auth))
        .or(build_user_route_filter(&auth))
        .recover(handle_auth_errors)
        .with(warp::trace::request());

    tracing::info!(%addr, "listening");
    warp::serve(all_routes).run(addr).await;

    Ok(())
}
