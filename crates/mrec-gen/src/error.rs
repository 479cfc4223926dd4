use mrec_isa::TranslateError;
use thiserror::Error;

/// Block generation errors. All are fatal to the `create` call that
/// raised them; no partial block is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("invalid entry point {address:#010x}")]
    InvalidEntryPoint { address: u32 },

    #[error("block at {address:#010x} exceeds {limit} instructions")]
    BlockTooLarge { address: u32, limit: usize },

    #[error("not implemented '{name}' at {address:#010x}")]
    NotImplemented { name: &'static str, address: u32 },
}

impl From<TranslateError> for GenError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::NotImplemented { name, address } => {
                Self::NotImplemented { name, address }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GenError>;
