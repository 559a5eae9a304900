use thiserror::Error;

pub type RfResult<T> = Result<T, RfError>;

#[derive(Error, Debug)]
pub enum RfError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
