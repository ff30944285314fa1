//! Credential-injecting relay to the stats provider
//!
//! Browsers never see the API key: they POST queries here and the proxy
//! re-sends them upstream with the server-held bearer token.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ProxyError;
pub use handlers::ProxyState;
pub use routes::{create_proxy_router, PROXY_PATH};
