pub mod application;
pub mod config;
pub mod error;

pub use application::*;
pub use config::Config;
pub use error::*;
