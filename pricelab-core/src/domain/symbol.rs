use std::fmt::{Display, Formatter};

use crate::error::PipelineError;

/// Ticker symbol that is safe to hand to an upstream source.
///
/// Only the leading run of ASCII alphanumerics and `- . _ =` survives
/// sanitization, so query syntax appended to a ticker never reaches the
/// upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    /// Extract the leading run of allowed characters from `input`.
    ///
    /// Surrounding whitespace is ignored; case is preserved.
    pub fn sanitize(input: &str) -> Result<Self, PipelineError> {
        let trimmed = input.trim();
        let end = trimmed
            .char_indices()
            .find(|&(_, ch)| !is_symbol_char(ch))
            .map(|(index, _)| index)
            .unwrap_or(trimmed.len());

        if end == 0 {
            return Err(PipelineError::InvalidSymbol {
                input: input.to_owned(),
            });
        }

        Ok(Self(trimmed[..end].to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '=')
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
