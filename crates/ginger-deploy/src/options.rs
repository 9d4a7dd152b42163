//! Per-invocation deploy options

/// Options resolved once per command and passed down every phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Deploy only this function
    pub function: Option<String>,
    /// Create a deployment snapshot for this stage after routing converges
    pub stage: Option<String>,
    /// Description attached to the stage snapshot
    pub message: Option<String>,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
