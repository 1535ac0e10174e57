use crate::services::providers::{
    CapabilityError, CapabilityResult, ReasoningCapability, VisionCapability,
};

/// Stand-in for a capability that is not configured
///
/// Every call fails with [`CapabilityError::Unavailable`], which routes callers onto
/// their deterministic fallback.
#[derive(Debug, Clone)]
pub struct UnavailableCapability {
    name: String,
}

impl UnavailableCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait::async_trait]
impl ReasoningCapability for UnavailableCapability {
    async fn reason(&self, _prompt: &str) -> CapabilityResult<String> {
        Err(CapabilityError::Unavailable(self.name.clone()))
    }
}

#[async_trait::async_trait]
impl VisionCapability for UnavailableCapability {
    async fn detect_books(&self, _image_url: &str) -> CapabilityResult<String> {
        Err(CapabilityError::Unavailable(self.name.clone()))
    }
}
