use std::{fmt, str::FromStr};

use super::{DescriptorError, Token};

pub const TOKEN_DELIMITER: char = '_';

/// Ordered operator sequence applied along every branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchitectureDescriptor {
    /// Built-in two-stage topology selected by an empty descriptor.
    Fallback,
    Tokens(Box<[Token]>),
}

impl ArchitectureDescriptor {
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        if text.is_empty() {
            return Ok(ArchitectureDescriptor::Fallback);
        }
        let tokens = text
            .split(TOKEN_DELIMITER)
            .enumerate()
            .map(|(position, token)| {
                Token::parse(token).map_err(|source| {
                    DescriptorError::AtPosition {
                        position,
                        source: Box::new(source),
                    }
                })
            })
            .collect::<Result<Box<[Token]>, _>>()?;
        Ok(ArchitectureDescriptor::Tokens(tokens))
    }

    pub fn tokens(&self) -> &[Token] {
        match self {
            ArchitectureDescriptor::Fallback => &[],
            ArchitectureDescriptor::Tokens(tokens) => tokens,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ArchitectureDescriptor::Fallback)
    }
}

impl FromStr for ArchitectureDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchitectureDescriptor::parse(s)
    }
}

impl fmt::Display for ArchitectureDescriptor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (index, token) in self.tokens().iter().enumerate() {
            if index > 0 {
                write!(f, "{TOKEN_DELIMITER}")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_fallback() {
        let descriptor = ArchitectureDescriptor::parse("").unwrap();
        assert!(descriptor.is_fallback());
        assert!(descriptor.tokens().is_empty());
        assert_eq!(descriptor.to_string(), "");
    }

    #[test]
    fn test_order_is_preserved() {
        let descriptor =
            ArchitectureDescriptor::parse("S8,3,2_R_D_S8,3,2_R_D").unwrap();
        assert_eq!(
            descriptor.tokens(),
            &[
                Token::SeparableConv {
                    filters: 8,
                    kernel_size: 3,
                    stride: 2,
                },
                Token::ReLU,
                Token::Dropout,
                Token::SeparableConv {
                    filters: 8,
                    kernel_size: 3,
                    stride: 2,
                },
                Token::ReLU,
                Token::Dropout,
            ]
        );
        assert_eq!(descriptor.to_string(), "S8,3,2_R_D_S8,3,2_R_D");
    }

    #[test]
    fn test_error_reports_position() {
        let error = ArchitectureDescriptor::parse("S8,3,2_R_Q").unwrap_err();
        assert_eq!(
            error,
            DescriptorError::AtPosition {
                position: 2,
                source: Box::new(DescriptorError::UnknownOpCode {
                    token: "Q".to_string()
                }),
            }
        );
    }

    #[test]
    fn test_double_delimiter_is_empty_token() {
        let error = ArchitectureDescriptor::parse("S8,3,1__R").unwrap_err();
        assert!(matches!(
            error,
            DescriptorError::AtPosition { position: 1, source }
                if *source == DescriptorError::EmptyToken
        ));
    }
}
