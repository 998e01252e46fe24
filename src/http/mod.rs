//! HTTP plumbing between the runner and the service under test

pub mod protocol;
pub mod transport;

pub use protocol::{join_url, HttpRequest, HttpResponse, Method};
pub use transport::{ReqwestTransport, Transport, TransportError};
