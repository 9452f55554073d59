pub mod http;
pub mod model;
pub mod service;
pub mod template;

pub use model::{OutgoingEmail, ProviderInvite, SentInvite};
pub use service::*;
