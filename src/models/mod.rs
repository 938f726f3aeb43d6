//! Data models for EduConnect entities

mod chat;
mod course;
mod help;
mod user;

pub use chat::*;
pub use course::*;
pub use help::*;
pub use user::*;
