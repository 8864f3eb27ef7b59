//! External collaborators for the dental clinic core.
//!
//! - [`media`]: remote image storage implementing [`dental_core::media::BlobStore`]
//! - [`messaging`]: WhatsApp messages implementing [`dental_core::messaging::Messenger`]
//!
//! Both read their configuration from the environment at call time. The HTTP
//! transport is only compiled with the `http` feature; without it every
//! remote call fails cleanly, which is what the unit tests exercise.

pub mod config;
pub mod media;
pub mod messaging;

pub use config::*;
pub use media::CloudinaryStore;
pub use messaging::WhatsAppMessenger;
