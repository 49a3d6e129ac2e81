pub mod command;
pub mod helpers;
pub mod simplex;

pub use command::{solve_tableau, solve_text, Error};
pub use simplex::{
    Branch, LoggedStep, Mode, Outcome, PivotStep, Solution, SolveError, SolverConfig, Tableau,
};
