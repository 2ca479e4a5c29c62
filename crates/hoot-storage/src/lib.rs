pub mod db;
pub mod migrations;
pub mod models;

pub use db::{Database, SessionState};
pub use models::{AiConfig, LastBlock, Notification, Session};
