use thiserror::Error;

/// Translation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// No semantics exist for this instruction type.
    #[error("not implemented '{name}' at {address:#010x}")]
    NotImplemented { name: &'static str, address: u32 },
}
