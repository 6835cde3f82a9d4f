use std::fmt::Debug;

use log::warn;

use crate::{CodecError, Violation};

/// Decides what happens to a recoverable format deviation: abort the decode, or fix it up and keep a warning.
/// Structural problems (truncation, bad magic, out of range indices) are fatal in both modes and never go
/// through here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Strictness {
    #[default]
    Strict,
    Lenient,
}

impl Strictness {
    pub fn from_strict_mode(strict_mode: bool) -> Self {
        if strict_mode {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }
}

/// A document together with the violations that were recovered while decoding it.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub document: T,
    pub warnings: Vec<Violation>,
}

/// The single place that turns a detected violation into either an error or a warning.
#[derive(Debug)]
pub struct Validator {
    strictness: Strictness,
    warnings: Vec<Violation>,
}

impl Validator {
    pub fn new(strictness: Strictness) -> Self {
        Validator {
            strictness,
            warnings: Vec::new(),
        }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Strict: `Err(FormatViolation)`. Lenient: the violation is logged and recorded, and the caller applies its
    /// best-effort substitution.
    pub fn violation(&mut self, offset: usize, detail: impl Into<String>) -> Result<(), CodecError> {
        let violation = Violation::at(offset, detail);
        match self.strictness {
            Strictness::Strict => Err(CodecError::FormatViolation(violation)),
            Strictness::Lenient => {
                warn!("Recovered format violation {}", violation);
                self.warnings.push(violation);
                Ok(())
            }
        }
    }

    /// Checks a constant header/marker field. Returns whether the value matched.
    pub fn expect_value<T: PartialEq + Debug>(
        &mut self,
        offset: usize,
        field: &str,
        expected: T,
        found: T,
    ) -> Result<bool, CodecError> {
        if expected == found {
            return Ok(true);
        }
        self.violation(
            offset,
            format!("unexpected {}: expected {:?}, found {:?}", field, expected, found),
        )?;
        Ok(false)
    }

    pub fn warnings(&self) -> &[Violation] {
        &self.warnings
    }

    pub fn finish<T>(self, document: T) -> Decoded<T> {
        Decoded {
            document,
            warnings: self.warnings,
        }
    }
}
