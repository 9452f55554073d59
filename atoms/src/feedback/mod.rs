pub mod http;
pub mod model;
pub mod service;

pub use model::{
    CreateFeedbackPayload, Feedback, FeedbackFilter, FeedbackPage, FeedbackQuery, FeedbackStatus,
    FeedbackUpdate, UpdateFeedbackPayload,
};
pub use service::*;
