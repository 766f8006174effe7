//! HTTP transport shared by the catalog and backend clients.

mod http;

pub use http::{endpoint_url, HttpTransport, TransportError};
