use derive_more::{Display, Error, IsVariant};

pub type SolveResult<T> = Result<T, SolveError>;

/// Ways a solve can fail once a tableau has been handed to the engine.
#[derive(Debug, Clone, PartialEq, Display, Error, IsVariant)]
pub enum SolveError {
    /// No constraint row limits the entering column.
    #[display(fmt = "the objective is unbounded: no pivot row for column {}", column)]
    Unbounded { column: usize },
    /// A constraint row has a negative right-hand side or no basic column with a zero
    /// objective-row entry, so the starting basis is not a feasible vertex.
    #[display(fmt = "the starting tableau has no feasible basic variable in row {}", row)]
    InfeasibleStart { row: usize },
    #[display(fmt = "did not converge after {} iterations", iterations)]
    DidNotConverge { iterations: usize },
    #[display(fmt = "malformed tableau: {}", reason)]
    MalformedTableau { reason: String },
}

/// Problem-file error, positioned at the offending line (1-based).
#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display(fmt = "line {}: {}", line, kind)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Display, Error, IsVariant)]
pub enum ParseErrorKind {
    #[display(fmt = "the problem sense (`max` or `min`) is missing")]
    MissingSense,
    #[display(fmt = "unknown problem sense `{}`", found)]
    UnknownSense { found: String },
    #[display(fmt = "the objective function has no terms")]
    EmptyObjective,
    #[display(fmt = "unexpected token `{}`", token)]
    InvalidToken { token: String },
    #[display(fmt = "`{}` is not a number", token)]
    InvalidNumber { token: String },
    #[display(fmt = "variable indices start at 1, found `{}`", token)]
    ZeroIndex { token: String },
    #[display(fmt = "variable index in `{}` is above the limit of {}", token, limit)]
    IndexTooLarge { token: String, limit: usize },
    #[display(fmt = "the constraint has no relation symbol")]
    MissingRelation,
    #[display(fmt = "unknown relation `{}`", found)]
    UnknownRelation { found: String },
    #[display(fmt = "the constraint has no right-hand side")]
    MissingRhs,
    #[display(fmt = "unexpected `{}` after the right-hand side", token)]
    TrailingTokens { token: String },
    #[display(fmt = "the problem has no constraints")]
    NoConstraints,
}
