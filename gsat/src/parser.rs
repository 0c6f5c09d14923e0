//! This module implements the parser for rule files.
//!
//! A rule file is a sequence of rules of the form `head :- body .` or `head .`,
//! where head and body are comma separated lists of atoms.
//! Terms are universal variables `?x`, existential variables `!y`,
//! and constants, which are identifiers starting with a lowercase letter,
//! quoted strings or integers. Comments start with `%` and extend to the end of the line.

use std::{collections::HashSet, path::Path};

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace1, satisfy},
    combinator::{cut, map, opt, recognize},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many0_count, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded},
    Err, IResult,
};
use thiserror::Error;

use crate::{
    error::Error,
    model::{RawAtom, RawRule, RawTerm},
};

/// Kinds of errors that can occur while parsing rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The input does not follow the rule syntax
    #[error("expected {0}")]
    Expected(&'static str),
    /// A variable marked as existential also occurs in the body
    #[error("existential variable `!{0}` occurs in the body")]
    ExistentialInBody(String),
    /// A universal variable that only occurs in the head
    #[error("universal variable `?{0}` does not occur in the body")]
    UnsafeHeadVariable(String),
}

/// Error while parsing rules, located by line and column (both starting at 1)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    /// Line of the error
    pub line: usize,
    /// Column of the error
    pub column: usize,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create an error located at the start of `remaining`, which must be a suffix of `source`.
    fn at(source: &str, remaining: &str, kind: ParseErrorKind) -> Self {
        let consumed = &source[..source.len() - remaining.len()];

        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |line| line.chars().count())
            + 1;

        Self { line, column, kind }
    }

    fn syntax(source: &str, error: Err<VerboseError<&str>>) -> Self {
        let errors = match error {
            Err::Error(error) | Err::Failure(error) => error.errors,
            Err::Incomplete(_) => Vec::new(),
        };

        let context = errors.iter().find_map(|(remaining, kind)| match kind {
            VerboseErrorKind::Context(context) => Some((*remaining, *context)),
            _ => None,
        });

        match context {
            Some((remaining, expected)) => {
                Self::at(source, remaining, ParseErrorKind::Expected(expected))
            }
            None => {
                let remaining = errors.first().map_or("", |(remaining, _)| *remaining);
                Self::at(source, remaining, ParseErrorKind::Expected("rule"))
            }
        }
    }
}

type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Term as written in the rule file
#[derive(Debug, Clone, Copy)]
enum ParsedTerm<'a> {
    Universal(&'a str),
    Existential(&'a str),
    Constant(&'a str),
}

#[derive(Debug)]
struct ParsedAtom<'a> {
    /// Input starting at this atom
    position: &'a str,
    predicate: &'a str,
    terms: Vec<ParsedTerm<'a>>,
}

fn comment(input: &str) -> ParserResult<'_, &str> {
    recognize(pair(char('%'), opt(is_not("\r\n"))))(input)
}

fn whitespace(input: &str) -> ParserResult<'_, ()> {
    map(many0_count(alt((multispace1, comment))), |_| ())(input)
}

fn identifier(input: &str) -> ParserResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn constant(input: &str) -> ParserResult<'_, &str> {
    let name = recognize(pair(
        satisfy(|c| c.is_ascii_lowercase()),
        many0_count(alt((alphanumeric1, tag("_")))),
    ));
    let string = recognize(delimited(char('"'), opt(is_not("\"")), char('"')));
    let integer = recognize(pair(opt(char('-')), digit1));

    alt((name, string, integer))(input)
}

fn term(input: &str) -> ParserResult<'_, ParsedTerm<'_>> {
    preceded(
        whitespace,
        context(
            "term",
            alt((
                map(preceded(char('?'), cut(identifier)), ParsedTerm::Universal),
                map(preceded(char('!'), cut(identifier)), ParsedTerm::Existential),
                map(constant, ParsedTerm::Constant),
            )),
        ),
    )(input)
}

fn atom(input: &str) -> ParserResult<'_, ParsedAtom<'_>> {
    let (position, _) = whitespace(input)?;

    let arguments = delimited(
        preceded(whitespace, char('(')),
        separated_list0(preceded(whitespace, char(',')), term),
        cut(preceded(whitespace, context("`)`", char(')')))),
    );

    let (rest, (predicate, terms)) =
        context("atom", pair(identifier, opt(arguments)))(position)?;

    Ok((
        rest,
        ParsedAtom {
            position,
            predicate,
            terms: terms.unwrap_or_default(),
        },
    ))
}

fn atoms(input: &str) -> ParserResult<'_, Vec<ParsedAtom<'_>>> {
    separated_list1(preceded(whitespace, char(',')), atom)(input)
}

/// Parse a rule, returning its head and body atoms.
#[allow(clippy::type_complexity)]
fn rule(input: &str) -> ParserResult<'_, (Vec<ParsedAtom<'_>>, Vec<ParsedAtom<'_>>)> {
    let (rest, head) = atoms(input)?;
    let (rest, body) = opt(preceded(preceded(whitespace, tag(":-")), cut(atoms)))(rest)?;
    let (rest, _) = cut(preceded(whitespace, context("`.`", char('.'))))(rest)?;

    Ok((rest, (head, body.unwrap_or_default())))
}

fn raw_atom(atom: &ParsedAtom<'_>) -> RawAtom {
    let terms = atom.terms.iter().map(|term| match term {
        ParsedTerm::Universal(name) | ParsedTerm::Existential(name) => RawTerm::variable(name),
        ParsedTerm::Constant(name) => RawTerm::constant(name),
    });

    RawAtom::new(atom.predicate, terms)
}

/// Check the quantifier markers of a parsed rule and translate it into a [RawRule].
fn raw_rule(
    source: &str,
    head: &[ParsedAtom<'_>],
    body: &[ParsedAtom<'_>],
) -> Result<RawRule, ParseError> {
    let mut universal = HashSet::new();

    for atom in body {
        for term in &atom.terms {
            match term {
                ParsedTerm::Universal(name) => {
                    universal.insert(*name);
                }
                ParsedTerm::Existential(name) => {
                    return Err(ParseError::at(
                        source,
                        atom.position,
                        ParseErrorKind::ExistentialInBody(name.to_string()),
                    ))
                }
                ParsedTerm::Constant(_) => {}
            }
        }
    }

    for atom in head {
        for term in &atom.terms {
            let kind = match term {
                ParsedTerm::Universal(name) if !universal.contains(name) => {
                    ParseErrorKind::UnsafeHeadVariable(name.to_string())
                }
                ParsedTerm::Existential(name) if universal.contains(name) => {
                    ParseErrorKind::ExistentialInBody(name.to_string())
                }
                _ => continue,
            };

            return Err(ParseError::at(source, atom.position, kind));
        }
    }

    Ok(RawRule::new(
        body.iter().map(raw_atom).collect(),
        head.iter().map(raw_atom).collect(),
    ))
}

/// Parse all rules in the given string.
pub fn parse_rules(input: &str) -> Result<Vec<RawRule>, ParseError> {
    let mut rules = Vec::new();
    let mut rest = input;

    loop {
        let (remaining, _) =
            whitespace(rest).map_err(|error| ParseError::syntax(input, error))?;
        if remaining.is_empty() {
            break;
        }

        let (remaining, (head, body)) =
            rule(remaining).map_err(|error| ParseError::syntax(input, error))?;
        rules.push(raw_rule(input, &head, &body)?);

        rest = remaining;
    }

    log::debug!("Parsed {} rules", rules.len());

    Ok(rules)
}

/// Read and parse the rule file at `path`.
pub fn read_rules<P: AsRef<Path>>(path: P) -> Result<Vec<RawRule>, Error> {
    let path = path.as_ref();
    log::info!("Reading rules from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|error| Error::IOReading {
        error,
        filename: path.to_path_buf(),
    })?;

    Ok(parse_rules(&content)?)
}
