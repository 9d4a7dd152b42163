//! Confirmation seam for destructive operations

/// Asks the operator before something is deleted
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirmation for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
