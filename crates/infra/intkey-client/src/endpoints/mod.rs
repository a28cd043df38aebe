//! Endpoint client implementations.

mod config;
pub use config::ClientConfig;

mod http;
pub use http::HttpEndpointClient;

mod traits;
pub use traits::ServiceEndpointClient;
