//! Outbound patient messaging collaborator.

/// Sends a formatted message to a patient.
///
/// Returns `false` on any failure. Callers treat delivery as best-effort and
/// never fail their primary flow because of it.
pub trait Messenger {
    fn send(&self, phone: &str, patient_name: &str, link: &str) -> bool;
}

/// Messenger that drops every message. Used where no channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMessenger;

impl Messenger for NoopMessenger {
    fn send(&self, phone: &str, _patient_name: &str, _link: &str) -> bool {
        tracing::debug!(phone, "no messaging channel configured, message dropped");
        false
    }
}
