use thiserror::Error;

use super::OpCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Empty token")]
    EmptyToken,
    #[error("Unknown opcode in token \"{token}\"")]
    UnknownOpCode {
        token: String,
    },
    #[error(
        "Token \"{token}\" expects {expected} parameter(s) for {op_code:?}, got {actual}"
    )]
    WrongParameterCount {
        token: String,
        op_code: OpCode,
        expected: usize,
        actual: usize,
    },
    #[error("Token \"{token}\" has invalid parameter \"{parameter}\"")]
    InvalidParameter {
        token: String,
        parameter: String,
    },
    #[error("Token {position}: {source}")]
    AtPosition {
        position: usize,
        #[source]
        source: Box<DescriptorError>,
    },
}
