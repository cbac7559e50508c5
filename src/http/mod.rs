// HTTP module.
// Transport abstraction, the default reqwest-backed transport, and shared request helpers.

pub mod client;
pub mod headers;
pub mod transport;

pub use client::ReqwestTransport;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport};
