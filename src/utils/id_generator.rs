//! Run identifier generation.

use uuid::Uuid;

/// Generates unique run identifiers.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A fresh `run-<uuid4>` identifier.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run-{}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_and_prefixed() {
        let ids = IdGenerator::new();
        let a = ids.generate_run_id();
        let b = ids.generate_run_id();
        assert!(a.starts_with("run-"));
        assert_ne!(a, b);
    }
}
