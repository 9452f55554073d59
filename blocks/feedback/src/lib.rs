pub mod listing;
pub mod types;

pub use listing::*;
