//! Camera capability authorization

use serde::{Deserialize, Serialize};

/// Authorization state for the camera-equivalent capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

impl CapabilityStatus {
    /// Denied and restricted never change without user action outside the app
    pub fn is_terminal_denial(&self) -> bool {
        matches!(self, CapabilityStatus::Denied | CapabilityStatus::Restricted)
    }
}

/// Consulted before a recenter resets the tracking session
pub trait CapabilityGate {
    fn authorization_status(&self) -> CapabilityStatus;
}

/// Gate reporting a fixed status
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilityGate(pub CapabilityStatus);

impl StaticCapabilityGate {
    pub fn authorized() -> Self {
        StaticCapabilityGate(CapabilityStatus::Authorized)
    }
}

impl CapabilityGate for StaticCapabilityGate {
    fn authorization_status(&self) -> CapabilityStatus {
        self.0
    }
}
