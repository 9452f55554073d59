pub mod http;
pub mod model;
pub mod service;

pub use model::{CreateUserPayload, CreatedUser, DeleteUserPayload, NewIdentity, Profile, UserRole};
pub use service::*;
