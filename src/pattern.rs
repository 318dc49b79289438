//! Parsers for the little strings the command line takes: button lists like
//! `1,5` or `1-3,5`, and light patterns like `10001` (light 1 first).

use crate::protocol::{ButtonSet, BUTTON_COUNT};
use nom::{
    character::complete::{char, one_of, space0, u8 as number},
    combinator::{all_consuming, map, opt},
    multi::{count, separated_list1},
    sequence::{delimited, pair, preceded},
    Finish, IResult,
};
use std::{error::Error, fmt};

/// Why a button list or light pattern was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The text does not parse; holds the part that could not be read.
    Syntax(String),
    /// A range like `4-2`.
    BackwardsRange(u8, u8),
    /// A button outside `1..=5`.
    NoSuchButton(u8),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Syntax(rest) => write!(f, "could not parse {:?}", rest),
            PatternError::BackwardsRange(lo, hi) => write!(f, "backwards range {}-{}", lo, hi),
            PatternError::NoSuchButton(b) => write!(f, "no such button: {}", b),
        }
    }
}

impl Error for PatternError {}

fn button_range(s: &str) -> IResult<&str, (u8, u8)> {
    map(
        pair(number, opt(preceded(char('-'), number))),
        |(lo, hi)| (lo, hi.unwrap_or(lo)),
    )(s)
}

fn button_list(s: &str) -> IResult<&str, Vec<(u8, u8)>> {
    separated_list1(delimited(space0, char(','), space0), button_range)(s)
}

fn light_pattern(s: &str) -> IResult<&str, Vec<bool>> {
    count(map(one_of("01"), |c| c == '1'), BUTTON_COUNT)(s)
}

/// Parse a comma separated list of buttons and inclusive ranges.
pub fn parse_buttons(s: &str) -> Result<ButtonSet, PatternError> {
    let (_, ranges) = all_consuming(delimited(space0, button_list, space0))(s)
        .finish()
        .map_err(|e| PatternError::Syntax(e.input.to_owned()))?;

    ranges.into_iter().try_fold(ButtonSet::EMPTY, |set, (lo, hi)| {
        if lo > hi {
            return Err(PatternError::BackwardsRange(lo, hi));
        }
        let range = ButtonSet::from_buttons(lo..=hi).map_err(|_| {
            PatternError::NoSuchButton(if (1..=BUTTON_COUNT as u8).contains(&lo) {
                hi
            } else {
                lo
            })
        })?;
        Ok(set.union(range))
    })
}

/// Parse exactly five `0`/`1` characters into a light vector.
pub fn parse_lights(s: &str) -> Result<[bool; BUTTON_COUNT], PatternError> {
    let (_, lights) = all_consuming(light_pattern)(s.trim())
        .finish()
        .map_err(|e| PatternError::Syntax(e.input.to_owned()))?;

    let mut out = [false; BUTTON_COUNT];
    out.copy_from_slice(&lights);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_buttons() {
        assert_eq!(parse_buttons("1,5").unwrap().to_vec(), vec![1, 5]);
        assert_eq!(parse_buttons(" 3 ").unwrap().to_vec(), vec![3]);
        assert_eq!(parse_buttons("2, 4").unwrap().to_vec(), vec![2, 4]);
    }

    #[test]
    fn ranges() {
        assert_eq!(parse_buttons("1-3,5").unwrap().to_vec(), vec![1, 2, 3, 5]);
        assert_eq!(parse_buttons("1-5").unwrap(), ButtonSet::ALL);
        assert_eq!(parse_buttons("4-2"), Err(PatternError::BackwardsRange(4, 2)));
    }

    #[test]
    fn bad_buttons() {
        assert_eq!(parse_buttons("6"), Err(PatternError::NoSuchButton(6)));
        assert_eq!(parse_buttons("3-7"), Err(PatternError::NoSuchButton(7)));
        assert_eq!(parse_buttons("0-2"), Err(PatternError::NoSuchButton(0)));
        assert!(matches!(parse_buttons("1;2"), Err(PatternError::Syntax(_))));
        assert!(matches!(parse_buttons(""), Err(PatternError::Syntax(_))));
    }

    #[test]
    fn light_patterns() {
        assert_eq!(
            parse_lights("10001").unwrap(),
            [true, false, false, false, true]
        );
        assert_eq!(parse_lights("00000").unwrap(), [false; BUTTON_COUNT]);
        assert!(matches!(parse_lights("1001"), Err(PatternError::Syntax(_))));
        assert!(matches!(parse_lights("100011"), Err(PatternError::Syntax(_))));
        assert!(matches!(parse_lights("10201"), Err(PatternError::Syntax(_))));
    }
}
