pub mod exercise;
pub mod session;
pub mod workout;
