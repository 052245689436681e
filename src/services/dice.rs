//! Dice notation (`XdY`, `XdY+Z`, `XdY-Z`) and rolling.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

pub const MAX_DICE: u32 = 100;
pub const MAX_SIDES: u32 = 100;
pub const MAX_BATCH: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("invalid notation '{0}' (expected XdY or XdY+Z)")]
    Notation(String),

    #[error("dice quantity must be between 1 and 100")]
    Quantity,

    #[error("dice sides must be between 2 and 100")]
    Sides,

    #[error("cannot roll with advantage and disadvantage at once")]
    AdvantageConflict,

    #[error("between 1 and 20 rolls per request")]
    BatchSize,
}

impl From<DiceError> for ApiError {
    fn from(err: DiceError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    pub quantity: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl Dice {
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let invalid = || DiceError::Notation(notation.to_string());
        let lowered = notation.trim().to_ascii_lowercase();
        let (quantity, rest) = lowered.split_once('d').ok_or_else(invalid)?;

        let (sides, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(at) => rest.split_at(at),
            None => (rest, ""),
        };

        let quantity: u32 = digits(quantity).ok_or_else(invalid)?;
        let sides: u32 = digits(sides).ok_or_else(invalid)?;
        let modifier: i32 = if modifier.is_empty() {
            0
        } else {
            let (sign, value) = modifier.split_at(1);
            let value: i32 = digits(value).ok_or_else(invalid)?;
            if sign == "-" {
                -value
            } else {
                value
            }
        };

        if !(1..=MAX_DICE).contains(&quantity) {
            return Err(DiceError::Quantity);
        }
        if !(2..=MAX_SIDES).contains(&sides) {
            return Err(DiceError::Sides);
        }
        Ok(Self { quantity, sides, modifier })
    }

    fn is_single_d20(&self) -> bool {
        self.quantity == 1 && self.sides == 20
    }
}

/// Non-empty run of ASCII digits, nothing else.
fn digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RollRequest {
    pub notation: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub advantage: bool,
    #[serde(default)]
    pub disadvantage: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RollResult {
    pub notation: String,
    pub quantity: u32,
    pub sides: u32,
    pub modifier: i32,
    pub rolls: Vec<i32>,
    pub total: i32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub advantage: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disadvantage: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_rolls: Vec<i32>,
}

pub fn roll(request: RollRequest) -> Result<RollResult, DiceError> {
    roll_with(&mut rand::rng(), request)
}

pub fn roll_many(requests: Vec<RollRequest>) -> Result<Vec<RollResult>, DiceError> {
    if requests.is_empty() || requests.len() > MAX_BATCH {
        return Err(DiceError::BatchSize);
    }
    let mut rng = rand::rng();
    requests.into_iter().map(|r| roll_with(&mut rng, r)).collect()
}

pub fn roll_with<R: Rng + ?Sized>(rng: &mut R, request: RollRequest) -> Result<RollResult, DiceError> {
    if request.advantage && request.disadvantage {
        return Err(DiceError::AdvantageConflict);
    }
    let dice = Dice::parse(&request.notation)?;
    let sides = dice.sides as i32;

    let mut dropped_rolls = Vec::new();
    let rolls = if (request.advantage || request.disadvantage) && dice.is_single_d20() {
        let first = rng.random_range(1..=sides);
        let second = rng.random_range(1..=sides);
        let (kept, dropped) = match (request.advantage, first >= second) {
            (true, true) | (false, false) => (first, second),
            _ => (second, first),
        };
        dropped_rolls.push(dropped);
        vec![kept]
    } else {
        (0..dice.quantity).map(|_| rng.random_range(1..=sides)).collect()
    };

    Ok(RollResult {
        notation: request.notation,
        quantity: dice.quantity,
        sides: dice.sides,
        modifier: dice.modifier,
        total: rolls.iter().sum::<i32>() + dice.modifier,
        rolls,
        timestamp: Utc::now(),
        label: request.label.filter(|l| !l.is_empty()),
        advantage: request.advantage,
        disadvantage: request.disadvantage,
        dropped_rolls,
    })
}
