pub mod backend;
pub mod blocked;
pub mod config;
pub mod daemon;
pub mod data;
pub mod focus;
pub mod helpers;
