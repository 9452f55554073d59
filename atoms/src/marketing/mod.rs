pub mod http;
pub mod model;
pub mod page;

pub use model::{PageState, Section};
pub use page::{render_page, SECTIONS};
