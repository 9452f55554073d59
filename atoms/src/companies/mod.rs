pub mod model;
pub mod service;

pub use model::Company;
pub use service::*;
