/// Default bound on instructions decoded for one block.
pub const DEFAULT_MAX_BLOCK_INSTRUCTIONS: usize = 100_000;

/// Block generator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Instructions a single pass may decode before giving up with
    /// `GenError::BlockTooLarge`.
    pub max_block_instructions: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_block_instructions: DEFAULT_MAX_BLOCK_INSTRUCTIONS,
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-block instruction bound.
    #[must_use]
    pub const fn with_max_block_instructions(mut self, limit: usize) -> Self {
        self.max_block_instructions = limit;
        self
    }
}
