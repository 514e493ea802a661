pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod web;

pub use adapters::storage::LocalStorage;
pub use app::StylistApp;
pub use config::AppConfig;
pub use crate::core::{FindOutfitsRequest, FittingRoom, SessionStore, Stylist, StylistSession};
pub use utils::error::{Result, StylistError};
