mod solve;

pub use solve::*;

use derive_more::{Display, Error, From};

use crate::simplex::{ParseError, SolveError};

/// Failure of a top-level solve request.
#[derive(Debug, Clone, PartialEq, Display, Error, From)]
pub enum Error {
    #[display(fmt = "{}", _0)]
    Parse(ParseError),
    #[display(fmt = "{}", _0)]
    Solve(SolveError),
}
