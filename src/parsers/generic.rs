use super::ResourceParser;

/// The default pipeline: first valid anchor is the primary resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl ResourceParser for Generic {
    fn name(&self) -> &str {
        "generic"
    }
}
