pub mod board;
pub mod notification;
pub mod project;
pub mod session;
pub mod user;
