use std::{fmt, str::FromStr};

use super::DescriptorError;

/// Leading character of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    SeparableConv,
    MaxPool,
    ReLU,
    Dropout,
    BatchNorm,
}

impl OpCode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(OpCode::SeparableConv),
            'P' => Some(OpCode::MaxPool),
            'R' => Some(OpCode::ReLU),
            'D' => Some(OpCode::Dropout),
            'N' => Some(OpCode::BatchNorm),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            OpCode::SeparableConv => 'S',
            OpCode::MaxPool => 'P',
            OpCode::ReLU => 'R',
            OpCode::Dropout => 'D',
            OpCode::BatchNorm => 'N',
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            OpCode::SeparableConv => 3,
            OpCode::MaxPool => 1,
            OpCode::ReLU | OpCode::Dropout | OpCode::BatchNorm => 0,
        }
    }
}

/// One parsed element of an architecture descriptor.
///
/// Grammar: `S<filters>,<kernel_size>,<stride>`, `P<pool_size>`, `R`, `D`, `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    SeparableConv {
        filters: usize,
        kernel_size: usize,
        stride: usize,
    },
    MaxPool {
        pool_size: usize,
    },
    ReLU,
    Dropout,
    BatchNorm,
}

impl Token {
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let mut chars = text.chars();
        let Some(first) = chars.next() else {
            return Err(DescriptorError::EmptyToken);
        };
        let op_code = OpCode::from_char(first).ok_or_else(|| {
            DescriptorError::UnknownOpCode {
                token: text.to_string(),
            }
        })?;
        let parameters = parse_parameters(text, op_code, chars.as_str())?;

        let token = match op_code {
            OpCode::SeparableConv => Token::SeparableConv {
                filters: parameters[0],
                kernel_size: parameters[1],
                stride: parameters[2],
            },
            OpCode::MaxPool => Token::MaxPool {
                pool_size: parameters[0],
            },
            OpCode::ReLU => Token::ReLU,
            OpCode::Dropout => Token::Dropout,
            OpCode::BatchNorm => Token::BatchNorm,
        };
        Ok(token)
    }

    pub fn op_code(&self) -> OpCode {
        match self {
            Token::SeparableConv {
                ..
            } => OpCode::SeparableConv,
            Token::MaxPool {
                ..
            } => OpCode::MaxPool,
            Token::ReLU => OpCode::ReLU,
            Token::Dropout => OpCode::Dropout,
            Token::BatchNorm => OpCode::BatchNorm,
        }
    }

    /// Convolution-family tokens take part in residual linking.
    pub fn is_convolution(&self) -> bool {
        self.op_code() == OpCode::SeparableConv
    }
}

fn parse_parameters(
    token: &str,
    op_code: OpCode,
    text: &str,
) -> Result<Vec<usize>, DescriptorError> {
    let expected = op_code.parameter_count();
    let raw: Vec<&str> = if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').collect()
    };
    if raw.len() != expected {
        return Err(DescriptorError::WrongParameterCount {
            token: token.to_string(),
            op_code,
            expected,
            actual: raw.len(),
        });
    }

    raw.into_iter()
        .map(|parameter| {
            parameter
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&value| value > 0)
                .ok_or_else(|| DescriptorError::InvalidParameter {
                    token: token.to_string(),
                    parameter: parameter.to_string(),
                })
        })
        .collect()
}

impl FromStr for Token {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::parse(s)
    }
}

impl fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Token::SeparableConv {
                filters,
                kernel_size,
                stride,
            } => write!(f, "S{filters},{kernel_size},{stride}"),
            Token::MaxPool {
                pool_size,
            } => write!(f, "P{pool_size}"),
            other => write!(f, "{}", other.op_code().as_char()),
        }
    }
}
