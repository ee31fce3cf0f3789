//! Lockdown check
//!
//! Denies every connection while attack mode is active. The chain holds
//! this check outside the priority-sorted list and evaluates it first, so
//! its maximum priority is structural and not user-configurable.

use crate::check::CheckDescriptor;

pub struct LockdownCheck {
    descriptor: CheckDescriptor,
    enabled: bool,
    message: String,
}

impl LockdownCheck {
    pub fn new(enabled: bool, message: String) -> Self {
        Self {
            descriptor: CheckDescriptor::new("lockdown", u8::MAX),
            enabled,
            message,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_detected(&self, under_attack: bool) -> bool {
        self.enabled && under_attack
    }
}
