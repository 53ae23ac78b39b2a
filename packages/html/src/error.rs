use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Nesting too deep at {pos}: more than {limit} open elements")]
    NestingTooDeep { pos: usize, limit: usize },
}

impl ParseError {
    pub fn nesting_too_deep(pos: usize, limit: usize) -> Self {
        Self::NestingTooDeep { pos, limit }
    }
}
