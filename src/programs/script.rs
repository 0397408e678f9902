//! Script programs - a one-line action language for binding programs from text
//!
//! Steps are separated by whitespace and the whole list repeats forever:
//!
//! ```text
//! R5 D3 T L5 T U3 T        move, grab-drop
//! I:A G R5 X O:C L5 W2     input, grab, drop, output, wait
//! B:R K:U                  bond right, unbond up
//! ```
//!
//! `L U R D` and `W` take an optional repeat count (default 1, never 0).

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alphanumeric1, char, digit1, multispace0, multispace1, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, value};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded};
use nom::{IResult, Parser};
use std::str::FromStr;

use crate::core::error::{ReactorError, Result};
use crate::core::types::Direction;
use crate::reactor::RegionLabel;
use crate::waldo::{ProgramContext, Step, WaldoProgram};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    Move(Direction, u32),
    Wait(u32),
    Grab,
    Drop,
    GrabDrop,
    Input(RegionLabel),
    Output(RegionLabel),
    Bond(Direction),
    Unbond(Direction),
}

fn direction(input: &str) -> IResult<&str, Direction> {
    map(one_of("LURD"), |c| match c {
        'L' => Direction::Left,
        'U' => Direction::Up,
        'R' => Direction::Right,
        _ => Direction::Down,
    })
    .parse(input)
}

fn count(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| match digits.parse::<u32>() {
        Ok(0) => Err("repeat count must be positive"),
        Ok(n) => Ok(n),
        Err(_) => Err("repeat count too large"),
    })
    .parse(input)
}

fn repeat(input: &str) -> IResult<&str, u32> {
    map(opt(count), |n| n.unwrap_or(1)).parse(input)
}

fn region(input: &str) -> IResult<&str, RegionLabel> {
    map_res(alphanumeric1, RegionLabel::from_str).parse(input)
}

fn step(input: &str) -> IResult<&str, ScriptStep> {
    alt((
        map(pair(direction, repeat), |(dir, n)| ScriptStep::Move(dir, n)),
        map(preceded(char('W'), repeat), ScriptStep::Wait),
        value(ScriptStep::Grab, char('G')),
        value(ScriptStep::Drop, char('X')),
        value(ScriptStep::GrabDrop, char('T')),
        map(preceded(tag("I:"), region), ScriptStep::Input),
        map(preceded(tag("O:"), region), ScriptStep::Output),
        map(preceded(tag("B:"), direction), ScriptStep::Bond),
        map(preceded(tag("K:"), direction), ScriptStep::Unbond),
    ))
    .parse(input)
}

fn script(input: &str) -> IResult<&str, Vec<ScriptStep>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(multispace1, step),
        multispace0,
    ))
    .parse(input)
}

/// A program that replays a parsed step list forever
#[derive(Debug, Clone)]
pub struct ScriptProgram {
    name: String,
    steps: Vec<ScriptStep>,
}

impl ScriptProgram {
    pub fn parse(text: &str) -> Result<Self> {
        let (_, steps) = script(text)
            .map_err(|e| ReactorError::Parse(format!("invalid script '{}': {}", text.trim(), e)))?;
        Ok(Self {
            name: "Script".to_string(),
            steps,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    fn perform(ctx: &mut ProgramContext, step: ScriptStep) -> Step<()> {
        match step {
            ScriptStep::Move(dir, n) => ctx.step_n(dir, n),
            ScriptStep::Wait(n) => ctx.wait_for(n),
            ScriptStep::Grab => ctx.grab().map(|_| ()),
            ScriptStep::Drop => ctx.drop(),
            ScriptStep::GrabDrop => ctx.grab_drop(),
            ScriptStep::Input(label) => ctx.input(label).map(|_| ()),
            ScriptStep::Output(label) => ctx.output(label).map(|_| ()),
            ScriptStep::Bond(dir) => ctx.bond(dir).map(|_| ()),
            ScriptStep::Unbond(dir) => ctx.unbond(dir).map(|_| ()),
        }
    }
}

impl FromStr for ScriptProgram {
    type Err = ReactorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl WaldoProgram for ScriptProgram {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn run(&mut self, ctx: &mut ProgramContext) -> Step<()> {
        loop {
            for &step in &self.steps {
                Self::perform(ctx, step)?;
            }
        }
    }
}
