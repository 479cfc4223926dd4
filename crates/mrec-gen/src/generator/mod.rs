//! Block formation with MIPS delay-slot semantics.

use mrec_ir::{BlockIR, Stmt};
use mrec_isa::{
    DecodedInstruction, Instruction, InstructionClassifier, MemoryReader, SemanticTranslator,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, trace_span};

use crate::compiler::CodeCompiler;
use crate::config::GeneratorConfig;
use crate::error::{GenError, Result};
use crate::usage::InstructionUsage;

/// Builds one basic block per `create` call.
///
/// A block runs from its entry address up to and including the first
/// terminator: a delayed branch (together with its delay slot) or a break.
/// The generator keeps a per-instance count of every instruction type it has
/// decoded as a block member. Delay-slot instructions are translated but not
/// counted.
pub struct BlockGenerator<M, K, T, C> {
    memory: M,
    classifier: K,
    translator: T,
    compiler: C,
    config: GeneratorConfig,
    usage: FxHashMap<&'static str, u64>,
}

impl<M, K, T, C> BlockGenerator<M, K, T, C>
where
    M: MemoryReader,
    K: InstructionClassifier,
    T: SemanticTranslator,
    C: CodeCompiler,
{
    #[must_use]
    pub fn new(memory: M, classifier: K, translator: T, compiler: C) -> Self {
        Self {
            memory,
            classifier,
            translator,
            compiler,
            config: GeneratorConfig::default(),
            usage: FxHashMap::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    pub const fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Generate and compile the block starting at `address`.
    ///
    /// # Errors
    ///
    /// See [`generate`](Self::generate).
    pub fn create(&mut self, address: u32) -> Result<C::Output> {
        let block = self.generate(address)?;
        Ok(self.compiler.compile(block))
    }

    /// Generate the IR of the block starting at `address`.
    ///
    /// # Errors
    ///
    /// - `InvalidEntryPoint` when `address` is zero.
    /// - `NotImplemented` when an instruction has no translation.
    /// - `BlockTooLarge` when no terminator is found within the configured
    ///   instruction bound.
    pub fn generate(&mut self, address: u32) -> Result<BlockIR> {
        if address == 0 {
            return Err(GenError::InvalidEntryPoint { address });
        }

        let _span = trace_span!("generate", start = format!("{address:#x}")).entered();
        let limit = self.config.max_block_instructions;
        let mut block = BlockIR::new(address);
        block.push(Stmt::FunctionPrefix);

        let mut pc = address;
        for _ in 0..limit {
            let decoded = self.decode_instruction(pc);
            self.record_usage(decoded.name());
            let ty = decoded.ty;

            if ty.has_delayed_branch {
                self.emit_delayed_branch(&mut block, &decoded)?;
                return Ok(Self::finish(block));
            }

            if ty.is_syscall {
                block.push(Stmt::StorePc {
                    pc: pc.wrapping_add(4),
                });
            }
            block.push(self.translator.translate(&decoded)?);
            block.cover(pc);

            if ty.is_break {
                block.push(Stmt::StorePc { pc });
                return Ok(Self::finish(block));
            }
            pc = pc.wrapping_add(4);
        }

        Err(GenError::BlockTooLarge { address, limit })
    }

    /// Emit a delayed branch, its delay slot, and the PC commit.
    ///
    /// A syscall in the delay slot is emitted after the PC commit; any other
    /// slot is emitted before it.
    fn emit_delayed_branch(
        &self,
        block: &mut BlockIR,
        branch: &DecodedInstruction,
    ) -> Result<()> {
        let pc = branch.pc();
        block.push(self.translator.translate(branch)?);
        block.cover(pc);

        let slot = self.decode_instruction(pc.wrapping_add(4));
        let slot_stmt = self.translator.translate(&slot)?;
        block.cover(slot.pc());

        let guarded = Stmt::likely(branch.ty.is_likely, slot_stmt);
        let commit = Stmt::PostBranch {
            next_pc: pc.wrapping_add(8),
        };
        if slot.ty.is_syscall {
            block.push(commit);
            block.push(guarded);
        } else {
            block.push(guarded);
            block.push(commit);
        }
        Ok(())
    }

    fn finish(block: BlockIR) -> BlockIR {
        debug!(
            start = format!("{:#x}", block.start_pc),
            end = format!("{:#x}", block.end_pc),
            stmts = block.len(),
            "block generated"
        );
        block
    }

    fn record_usage(&mut self, name: &'static str) {
        let count = self.usage.entry(name).or_insert(0);
        if *count == 0 {
            trace!(name, "new instruction");
        }
        *count += 1;
    }

    /// Fetch and classify the word at `address`. Does not touch usage counts.
    #[must_use]
    pub fn decode_instruction(&self, address: u32) -> DecodedInstruction {
        let instruction = Instruction::fetch(&self.memory, address);
        let ty = self.classifier.classify(instruction.word, address);
        DecodedInstruction::new(instruction, ty)
    }

    /// Usage counts, most frequent first. Equal counts are ordered by name.
    #[must_use]
    pub fn instruction_usage(&self) -> Vec<InstructionUsage> {
        let mut usage: Vec<_> = self
            .usage
            .iter()
            .map(|(&name, &count)| InstructionUsage { name, count })
            .collect();
        usage.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(b.name)));
        usage
    }

    /// Forget all usage counts.
    pub fn reset_instruction_usage(&mut self) {
        self.usage.clear();
    }
}

#[cfg(test)]
mod tests;
