use thiserror::Error;

/// Recompiler errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("generation failed: {0}")]
    Generate(#[from] mrec_gen::GenError),
    #[error("execution failed: {0}")]
    Exec(#[from] mrec_exec::ExecError),
    #[error("memory error: {0}")]
    Memory(#[from] mrec_state::MemoryError),
    #[error("translation failed: {0}")]
    Translate(#[from] mrec_isa::TranslateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image of {size} bytes does not fit at base {base:#010x}")]
    ImageTooLarge { base: u32, size: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
