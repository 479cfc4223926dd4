use mrec_ir::BlockIR;

/// Turns block IR into something invocable.
///
/// Compilation is infallible: every statement the generator emits must be
/// representable by the compiler.
pub trait CodeCompiler {
    type Output;

    fn compile(&self, block: BlockIR) -> Self::Output;
}

impl<C: CodeCompiler + ?Sized> CodeCompiler for &C {
    type Output = C::Output;

    fn compile(&self, block: BlockIR) -> Self::Output {
        (**self).compile(block)
    }
}

/// Compiler that returns the IR unchanged. Used for dumping and inspection.
#[derive(Clone, Copy, Debug, Default)]
pub struct IrCompiler;

impl CodeCompiler for IrCompiler {
    type Output = BlockIR;

    fn compile(&self, block: BlockIR) -> BlockIR {
        block
    }
}
