use std::{
    collections::HashMap,
    fmt,
    num::IntErrorKind,
    ops::{Mul, MulAssign},
    str::FromStr,
};

use derive_more::{Display, IsVariant};
use derive_new::new;
use lazy_static::lazy_static;
use nalgebra::{DMatrix, RowDVector};
use num_traits::Zero;
use super::{
    check_start,
    error::{ParseError, ParseErrorKind},
    run, Mode, Outcome, SolveResult, SolverConfig, Tableau, OBJECTIVE_LABEL, RHS_LABEL,
};


/// Largest variable index the problem format accepts.
pub const MAX_VARIABLES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum Sense {
    #[display(fmt = "max")]
    Maximize,
    #[display(fmt = "min")]
    Minimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Sign {
    #[display(fmt = "<=")]
    Less,
    #[display(fmt = "=")]
    Equals,
    #[display(fmt = ">=")]
    Greater,
}

lazy_static! {
    static ref RELATIONS: HashMap<&'static str, Sign> = HashMap::from([
        ("<=", Sign::Less),
        ("≤", Sign::Less),
        ("=", Sign::Equals),
        ("==", Sign::Equals),
        (">=", Sign::Greater),
        ("≥", Sign::Greater),
    ]);
}

#[derive(Debug, Clone, PartialEq, new)]
pub struct ObjectiveFunction {
    pub(crate) coefficients: RowDVector<f64>,
    pub(crate) sense: Sense,
}

#[derive(Debug, Clone, PartialEq, new)]
pub struct Constraint {
    pub(crate) coefficients: RowDVector<f64>,
    pub(crate) sign: Sign,
    pub(crate) rhs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub(crate) objective_function: ObjectiveFunction,
    pub(crate) constraints: Vec<Constraint>,
}

impl Problem {
    /// Builds a problem, padding shorter coefficient vectors with zeros up to the widest one.
    pub fn new(objective_function: ObjectiveFunction, constraints: Vec<Constraint>) -> Self {
        Self::normalize(objective_function, constraints)
    }

    pub fn sense(&self) -> Sense {
        self.objective_function.sense
    }

    pub fn n_variables(&self) -> usize {
        self.objective_function.coefficients.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn solve(&self, config: SolverConfig) -> SolveResult<Outcome> {
        let (tableau, mode) = self.to_tableau()?;
        run(tableau, mode, config)
    }

    /// Lays the problem out as an initial tableau: `max` problems directly, `min` problems as
    /// their dual.
    ///
    /// A `min` problem whose dual has no feasible slack basis (some cost is negative) is laid out
    /// as `max` of the negated objective instead, when that one does have a feasible slack basis.
    /// Otherwise the dual is returned and the solve rejects it.
    pub fn to_tableau(&self) -> SolveResult<(Tableau, Mode)> {
        match self.objective_function.sense {
            Sense::Maximize => {
                let primal = self.primal_tableau(&self.objective_function.coefficients)?;
                Ok((primal, Mode::Primal))
            }
            Sense::Minimize => {
                let dual = self.dual_tableau()?;
                if check_start(&dual, 0.).is_ok() {
                    return Ok((dual, Mode::Dual));
                }
                let negated_costs = -self.objective_function.coefficients.clone();
                let negated = self.primal_tableau(&negated_costs)?;
                if check_start(&negated, 0.).is_ok() {
                    log::info!("Dual has no feasible start, maximizing the negated objective");
                    return Ok((negated, Mode::Negated));
                }
                Ok((dual, Mode::Dual))
            }
        }
    }

    /// Pads every coefficient vector to the same number of variables.
    #[inline]
    fn normalize(
        mut objective_function: ObjectiveFunction,
        mut constraints: Vec<Constraint>,
    ) -> Self {
        let max_coefficients_count = constraints
            .iter()
            .map(|constraint| constraint.coefficients.len())
            .chain([objective_function.coefficients.len()])
            .max()
            .unwrap_or_default();

        constraints
            .iter_mut()
            .map(|constraint| &mut constraint.coefficients)
            .chain([&mut objective_function.coefficients])
            .for_each(|coefficients| {
                let current_len = coefficients.len();
                if current_len < max_coefficients_count {
                    *coefficients = coefficients.clone().insert_columns(
                        current_len,
                        max_coefficients_count - current_len,
                        0.,
                    );
                }
            });

        Self {
            objective_function,
            constraints,
        }
    }

    /// `max costs·x` laid out as `x1..xn, s1..sm, z, sol`; one slack column per constraint.
    fn primal_tableau(&self, costs: &RowDVector<f64>) -> SolveResult<Tableau> {
        let n = self.n_variables();
        let m = self.constraints.len();
        let constraints = self
            .constraints
            .iter()
            .map(|constraint| {
                if constraint.rhs < 0. {
                    constraint.clone() * -1.
                } else {
                    constraint.clone()
                }
            })
            .collect::<Vec<_>>();

        let matrix = DMatrix::from_fn(m + 1, n + m + 2, |i, j| {
            if i < m {
                let constraint = &constraints[i];
                match j {
                    j if j < n => constraint.coefficients[j],
                    j if j == n + i => match constraint.sign {
                        Sign::Less => 1.,
                        Sign::Equals => 0.,
                        Sign::Greater => -1.,
                    },
                    j if j == n + m + 1 => constraint.rhs,
                    _ => 0.,
                }
            } else {
                match j {
                    j if j < n => -costs[j],
                    j if j == n + m => 1.,
                    _ => 0.,
                }
            }
        });
        let labels = numbered('x', n)
            .chain(numbered('s', m))
            .chain([OBJECTIVE_LABEL.to_owned(), RHS_LABEL.to_owned()])
            .collect();

        Tableau::new(matrix, labels)
    }

    /// Dual of `min c·x s.t. A x >= b, x >= 0`, i.e. `max b·y s.t. Aᵀ y <= c, y >= 0`, laid out
    /// as `y1..yk, s1..sn, z, sol` where `sj` is the slack of the row belonging to `xj`.
    fn dual_tableau(&self) -> SolveResult<Tableau> {
        let n = self.n_variables();
        // Every row in `>=` form; an equality becomes a pair of opposite inequalities.
        let rows = self
            .constraints
            .iter()
            .flat_map(|constraint| match constraint.sign {
                Sign::Greater => vec![constraint.clone()],
                Sign::Less => vec![constraint.clone() * -1.],
                Sign::Equals => vec![
                    Constraint::new(
                        constraint.coefficients.clone(),
                        Sign::Greater,
                        constraint.rhs,
                    ),
                    Constraint::new(
                        -constraint.coefficients.clone(),
                        Sign::Greater,
                        -constraint.rhs,
                    ),
                ],
            })
            .collect::<Vec<_>>();
        let k = rows.len();
        let costs = &self.objective_function.coefficients;
        log::debug!("Dual problem has {k} variables and {n} constraints");

        let matrix = DMatrix::from_fn(n + 1, k + n + 2, |i, j| {
            if i < n {
                match j {
                    j if j < k => rows[j].coefficients[i],
                    j if j == k + i => 1.,
                    j if j == k + n + 1 => costs[i],
                    _ => 0.,
                }
            } else {
                match j {
                    j if j < k => -rows[j].rhs,
                    j if j == k + n => 1.,
                    _ => 0.,
                }
            }
        });
        let labels = numbered('y', k)
            .chain(numbered('s', n))
            .chain([OBJECTIVE_LABEL.to_owned(), RHS_LABEL.to_owned()])
            .collect();

        Tableau::new(matrix, labels)
    }
}

fn numbered(prefix: char, count: usize) -> impl Iterator<Item = String> {
    (1..=count).map(move |i| format!("{prefix}{i}"))
}

impl FromStr for Problem {
    type Err = ParseError;

    /// Parses the problem file format:
    ///
    /// ```text
    /// max
    /// z = 3x1 + 5x2
    /// x1 + x2 <= 4
    /// x1 + 3x2 <= 6
    /// ```
    ///
    /// Blank lines and `#` comments are skipped.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut lines = input
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or_default().trim()))
            .filter(|(_, line)| !line.is_empty());

        let (sense_line, sense_text) = lines
            .next()
            .ok_or(ParseError::new(1, ParseErrorKind::MissingSense))?;
        let sense = parse_sense(sense_text).map_err(|kind| ParseError::new(sense_line, kind))?;

        let (objective_line, objective_text) = lines
            .next()
            .ok_or(ParseError::new(sense_line + 1, ParseErrorKind::EmptyObjective))?;
        let objective = parse_objective(objective_text)
            .map_err(|kind| ParseError::new(objective_line, kind))?;

        let mut last_line = objective_line;
        let constraints = lines
            .map(|(line, text)| {
                last_line = line;
                parse_constraint(text).map_err(|kind| ParseError::new(line, kind))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if constraints.is_empty() {
            return Err(ParseError::new(last_line + 1, ParseErrorKind::NoConstraints));
        }

        let n = objective
            .iter()
            .chain(constraints.iter().flat_map(|(terms, _, _)| terms))
            .map(|(index, _)| *index)
            .max()
            .unwrap_or_default();

        Ok(Self::new(
            ObjectiveFunction::new(dense(&objective, n), sense),
            constraints
                .iter()
                .map(|(terms, sign, rhs)| Constraint::new(dense(terms, n), *sign, *rhs))
                .collect(),
        ))
    }
}

/// Coefficient `i` of the result belongs to `x(i+1)`; absent variables get 0.
fn dense(terms: &[(usize, f64)], n: usize) -> RowDVector<f64> {
    let mut coefficients = RowDVector::zeros(n);
    for (index, coefficient) in terms {
        coefficients[index - 1] += coefficient;
    }
    coefficients
}

fn parse_sense(text: &str) -> Result<Sense, ParseErrorKind> {
    match text.to_lowercase().as_str() {
        "max" | "maximize" | "maximise" => Ok(Sense::Maximize),
        "min" | "minimize" | "minimise" => Ok(Sense::Minimize),
        _ if text.contains(['=', '<', '>', '≤', '≥']) => Err(ParseErrorKind::MissingSense),
        _ => Err(ParseErrorKind::UnknownSense {
            found: text.to_owned(),
        }),
    }
}

fn parse_objective(text: &str) -> Result<Vec<(usize, f64)>, ParseErrorKind> {
    let tokens = text.split_whitespace().collect::<Vec<_>>();
    // optional `z =` in front of the terms
    let tokens = match tokens.as_slice() {
        [name, "=", rest @ ..] if parse_term(name).is_err() => rest,
        all => all,
    };
    let terms = parse_terms(tokens)?;
    if terms.is_empty() {
        return Err(ParseErrorKind::EmptyObjective);
    }
    Ok(terms)
}

fn parse_constraint(text: &str) -> Result<(Vec<(usize, f64)>, Sign, f64), ParseErrorKind> {
    let tokens = text.split_whitespace().collect::<Vec<_>>();
    let relation = tokens
        .iter()
        .position(|token| {
            RELATIONS.contains_key(*token) || token.contains(['=', '<', '>', '≤', '≥'])
        })
        .ok_or(ParseErrorKind::MissingRelation)?;
    let sign = *RELATIONS
        .get(tokens[relation])
        .ok_or_else(|| ParseErrorKind::UnknownRelation {
            found: tokens[relation].to_owned(),
        })?;

    let terms = parse_terms(&tokens[..relation])?;
    let rhs = match &tokens[relation + 1..] {
        [] => return Err(ParseErrorKind::MissingRhs),
        [rhs] => parse_number(rhs)?,
        [_, extra, ..] => {
            return Err(ParseErrorKind::TrailingTokens {
                token: (*extra).to_owned(),
            })
        }
    };

    Ok((terms, sign, rhs))
}

/// `3x1 + x2 - 2.5x3`; a standalone `-` negates the term after it.
fn parse_terms(tokens: &[&str]) -> Result<Vec<(usize, f64)>, ParseErrorKind> {
    let mut negate = false;
    let mut pending_sign = None;
    let mut terms = Vec::with_capacity(tokens.len());
    for token in tokens {
        match *token {
            "+" => pending_sign = Some(*token),
            "-" => {
                negate = !negate;
                pending_sign = Some(*token);
            }
            term => {
                let (index, coefficient) = parse_term(term)?;
                terms.push((index, if negate { -coefficient } else { coefficient }));
                negate = false;
                pending_sign = None;
            }
        }
    }
    match pending_sign {
        Some(sign) => Err(ParseErrorKind::InvalidToken {
            token: sign.to_owned(),
        }),
        None => Ok(terms),
    }
}

fn parse_term(token: &str) -> Result<(usize, f64), ParseErrorKind> {
    let (coefficient, index) = token
        .rsplit_once('x')
        .ok_or_else(|| ParseErrorKind::InvalidToken {
            token: token.to_owned(),
        })?;
    let index = match index.parse::<usize>() {
        Ok(index) => index,
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => {
            return Err(ParseErrorKind::IndexTooLarge {
                token: token.to_owned(),
                limit: MAX_VARIABLES,
            })
        }
        Err(_) => {
            return Err(ParseErrorKind::InvalidToken {
                token: token.to_owned(),
            })
        }
    };
    if index.is_zero() {
        return Err(ParseErrorKind::ZeroIndex {
            token: token.to_owned(),
        });
    }
    if index > MAX_VARIABLES {
        return Err(ParseErrorKind::IndexTooLarge {
            token: token.to_owned(),
            limit: MAX_VARIABLES,
        });
    }
    let coefficient = match coefficient {
        "" | "+" => 1.,
        "-" => -1.,
        number => parse_number(number).map_err(|_| ParseErrorKind::InvalidNumber {
            token: token.to_owned(),
        })?,
    };
    Ok((index, coefficient))
}

fn parse_number(token: &str) -> Result<f64, ParseErrorKind> {
    token
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ParseErrorKind::InvalidNumber {
            token: token.to_owned(),
        })
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.objective_function.sense)?;
        writeln!(f, "z = {}", Terms(&self.objective_function.coefficients))?;
        for constraint in &self.constraints {
            writeln!(
                f,
                "{} {} {}",
                Terms(&constraint.coefficients),
                constraint.sign,
                constraint.rhs
            )?;
        }
        Ok(())
    }
}

struct Terms<'a>(&'a RowDVector<f64>);

impl fmt::Display for Terms<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (i, coefficient) in self.0.iter().enumerate() {
            if coefficient.is_zero() {
                continue;
            }
            let magnitude = coefficient.abs();
            match (first, *coefficient < 0.) {
                (true, true) => write!(f, "-")?,
                (true, false) => {}
                (false, true) => write!(f, " - ")?,
                (false, false) => write!(f, " + ")?,
            }
            if magnitude != 1. {
                write!(f, "{magnitude}")?;
            }
            write!(f, "x{}", i + 1)?;
            first = false;
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}

impl Mul<f64> for Sign {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        if rhs >= 0. {
            return self;
        }
        match self {
            Sign::Less => Sign::Greater,
            Sign::Equals => self,
            Sign::Greater => Sign::Less,
        }
    }
}

impl MulAssign<f64> for Sign {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl Mul<f64> for Constraint {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            coefficients: self.coefficients * rhs,
            rhs: self.rhs * rhs,
            sign: self.sign * rhs,
        }
    }
}

impl MulAssign<f64> for Constraint {
    fn mul_assign(&mut self, rhs: f64) {
        self.coefficients *= rhs;
        self.rhs *= rhs;
        self.sign *= rhs;
    }
}
