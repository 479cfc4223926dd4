//! Recompiler facade over the Allegrex table, translator and interpreter.

use std::sync::Arc;

use mrec_exec::{CompiledBlock, Interpreter};
use mrec_gen::{BlockGenerator, GenError, GeneratorConfig, InstructionUsage};
use mrec_ir::BlockIR;
use mrec_isa::{AllegrexTable, AllegrexTranslator, DecodedInstruction, disasm};
use mrec_state::GuestMemory;
use parking_lot::Mutex;

use crate::error::Result;
use crate::metrics;

/// Block generator wired to the Allegrex collaborators.
pub type AllegrexGenerator<C> = BlockGenerator<GuestMemory, AllegrexTable, AllegrexTranslator, C>;

/// Allegrex block recompiler.
///
/// Owns a generator over a guest memory image. Usage counts accumulate
/// across `create` calls on the same instance.
pub struct Recompiler {
    generator: AllegrexGenerator<Interpreter>,
}

impl Recompiler {
    /// Create a recompiler with default configuration.
    #[must_use]
    pub fn new(memory: GuestMemory) -> Self {
        Self::with_config(memory, GeneratorConfig::default())
    }

    /// Create a recompiler with the given configuration.
    #[must_use]
    pub fn with_config(memory: GuestMemory, config: GeneratorConfig) -> Self {
        let generator = BlockGenerator::new(
            memory,
            AllegrexTable::new(),
            AllegrexTranslator::new(),
            Interpreter::new(),
        )
        .with_config(config);
        Self { generator }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        self.generator.config()
    }

    /// Guest memory the recompiler reads code from.
    #[must_use]
    pub const fn memory(&self) -> &GuestMemory {
        self.generator.memory()
    }

    /// Mutable access to guest memory, e.g. to patch code before generation.
    pub const fn memory_mut(&mut self) -> &mut GuestMemory {
        self.generator.memory_mut()
    }

    /// Generate and compile the block at `address`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generate` for an invalid entry point, an unsupported
    /// instruction, or a block with no terminator within the bound.
    pub fn create(&mut self, address: u32) -> Result<CompiledBlock> {
        let result = self.generator.create(address);
        match &result {
            Ok(block) => metrics::record_block(block.guest_instructions()),
            Err(err) => metrics::record_failure(err),
        }
        Ok(result?)
    }

    /// Generate the IR of the block at `address` without compiling it.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    pub fn lift(&mut self, address: u32) -> Result<BlockIR> {
        let result = self.generator.generate(address);
        match &result {
            Ok(block) => metrics::record_block(block.guest_instructions),
            Err(err) => metrics::record_failure(err),
        }
        Ok(result?)
    }

    /// Decode the instruction at `address` without counting it.
    #[must_use]
    pub fn decode_instruction(&self, address: u32) -> DecodedInstruction {
        self.generator.decode_instruction(address)
    }

    /// Disassemble the instruction at `address`.
    #[must_use]
    pub fn disassemble(&self, address: u32) -> String {
        disasm(&self.decode_instruction(address))
    }

    /// Usage counts, most frequent first.
    #[must_use]
    pub fn instruction_usage(&self) -> Vec<InstructionUsage> {
        self.generator.instruction_usage()
    }

    /// Forget all usage counts.
    pub fn reset_instruction_usage(&mut self) {
        self.generator.reset_instruction_usage();
    }

    /// Wrap in a lock for use from several threads.
    #[must_use]
    pub fn into_shared(self) -> SharedRecompiler {
        SharedRecompiler::new(self)
    }
}

/// A `Recompiler` behind a mutex. Each generation pass holds the lock for
/// its whole duration.
#[derive(Clone)]
pub struct SharedRecompiler {
    inner: Arc<Mutex<Recompiler>>,
}

impl SharedRecompiler {
    #[must_use]
    pub fn new(recompiler: Recompiler) -> Self {
        Self {
            inner: Arc::new(Mutex::new(recompiler)),
        }
    }

    /// Generate and compile the block at `address`.
    ///
    /// # Errors
    ///
    /// Same as [`Recompiler::create`].
    pub fn create(&self, address: u32) -> Result<CompiledBlock> {
        self.inner.lock().create(address)
    }

    #[must_use]
    pub fn instruction_usage(&self) -> Vec<InstructionUsage> {
        self.inner.lock().instruction_usage()
    }

    /// Run `f` with exclusive access to the recompiler.
    pub fn with<R>(&self, f: impl FnOnce(&mut Recompiler) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<Recompiler> for SharedRecompiler {
    fn from(recompiler: Recompiler) -> Self {
        Self::new(recompiler)
    }
}

/// Short label for a generation failure, used as a metrics dimension.
pub(crate) const fn failure_kind(err: &GenError) -> &'static str {
    match err {
        GenError::InvalidEntryPoint { .. } => "invalid_entry_point",
        GenError::BlockTooLarge { .. } => "block_too_large",
        GenError::NotImplemented { .. } => "not_implemented",
    }
}
