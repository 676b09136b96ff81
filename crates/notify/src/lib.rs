//! Digest notifications for newly ingested applications.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - SMTP email and log channel implementations
//! - Minijinja template rendering for the digest message
//! - `DigestNotifier`, which composes one digest per batch and hands it to a channel

pub mod digest;
pub mod email;
pub mod log;
pub mod templating;
pub mod traits;

pub use digest::DigestNotifier;
pub use traits::{Notification, Notifier, NotifyError};
