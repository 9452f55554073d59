pub mod http;
pub mod service;

pub use service::*;

/// Raw upstream reply: status code and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}
