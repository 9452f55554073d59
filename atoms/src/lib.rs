pub mod companies;
pub mod contracts;
pub mod error;
pub mod feedback;
pub mod invites;
pub mod marketing;
pub mod patch;
pub mod ports;
pub mod response;
pub mod users;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::ApiError;
pub use patch::Patch;
