use std::fmt::{Display, Formatter};

use thiserror::Error;

/// A semantic or structural problem found in a file, with the byte offset it was found at when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub offset: Option<usize>,
    pub detail: String,
}

impl Violation {
    pub fn at(offset: usize, detail: impl Into<String>) -> Self {
        Violation {
            offset: Some(offset),
            detail: detail.into(),
        }
    }

    /// For problems found while encoding, where there is no input offset.
    pub fn unplaced(detail: impl Into<String>) -> Self {
        Violation {
            offset: None,
            detail: detail.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "at byte offset {}: {}", offset, self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Truncated data at byte offset {offset}: needed {needed} bytes, but only {available} remain")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("The length prefix at byte offset {offset} announces {declared} bytes, but only {remaining} remain")]
    Overflow {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("Wrong file type or unsupported version {0}")]
    BadMagicOrVersion(Violation),

    #[error("Index out of bounds {0}")]
    IndexOutOfBounds(Violation),

    #[error("The file is violating the expected format {0}")]
    FormatViolation(Violation),

    /// Export only: the geometry can not be represented in the target format.
    #[error("Unsupported geometry: {reason}")]
    UnsupportedGeometry { reason: String },

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl CodecError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        CodecError::UnsupportedGeometry { reason: reason.into() }
    }

    /// The byte offset the error refers to, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::TruncatedData { offset, .. } | CodecError::Overflow { offset, .. } => Some(*offset),
            CodecError::BadMagicOrVersion(violation)
            | CodecError::IndexOutOfBounds(violation)
            | CodecError::FormatViolation(violation) => violation.offset,
            CodecError::UnsupportedGeometry { .. } | CodecError::IOError(_) => None,
        }
    }
}

pub mod anim;
pub mod common;
pub mod mesh;
pub mod phys;
