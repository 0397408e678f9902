//! Chemical elements available in the reactor
//!
//! Only the first three periods are modelled. Bond limits are puzzle limits,
//! not real valences.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ReactorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Element {
    Unknown = 0,
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
}

/// (full name, max bonds) indexed by ordinal
const ELEMENT_TABLE: [(&str, u8); 19] = [
    ("Unknown", 0),
    ("Hydrogen", 1),
    ("Helium", 0),
    ("Lithium", 1),
    ("Beryllium", 2),
    ("Boron", 3),
    ("Carbon", 4),
    ("Nitrogen", 5),
    ("Oxygen", 2),
    ("Fluorine", 1),
    ("Neon", 0),
    ("Sodium", 1),
    ("Magnesium", 2),
    ("Aluminium", 4),
    ("Silicon", 4),
    ("Phosphorus", 5),
    ("Sulphur", 6),
    ("Chlorine", 7),
    ("Argon", 0),
];

impl Element {
    pub const ALL: [Element; 18] = [
        Element::H,
        Element::He,
        Element::Li,
        Element::Be,
        Element::B,
        Element::C,
        Element::N,
        Element::O,
        Element::F,
        Element::Ne,
        Element::Na,
        Element::Mg,
        Element::Al,
        Element::Si,
        Element::P,
        Element::S,
        Element::Cl,
        Element::Ar,
    ];

    /// Look up by atomic number; anything out of range is `Unknown`
    pub fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            1..=18 => Self::ALL[ordinal as usize - 1],
            _ => Element::Unknown,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn max_bonds(self) -> u8 {
        ELEMENT_TABLE[self.ordinal() as usize].1
    }

    pub fn full_name(self) -> &'static str {
        ELEMENT_TABLE[self.ordinal() as usize].0
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Element::Unknown => "?",
            Element::H => "H",
            Element::He => "He",
            Element::Li => "Li",
            Element::Be => "Be",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Ne => "Ne",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Al => "Al",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Ar => "Ar",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ReactorError;

    /// Accepts a symbol ("Cl") or a full name ("chlorine")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.symbol() == s || e.full_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReactorError::UnknownElement(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_round_trip() {
        for element in Element::ALL {
            assert_eq!(Element::from_ordinal(element.ordinal()), element);
        }
    }

    #[test]
    fn test_invalid_ordinal_is_unknown() {
        assert_eq!(Element::from_ordinal(0), Element::Unknown);
        assert_eq!(Element::from_ordinal(19), Element::Unknown);
        assert_eq!(Element::from_ordinal(255).max_bonds(), 0);
        assert_eq!(Element::from_ordinal(200).full_name(), "Unknown");
    }

    #[test]
    fn test_bond_limits() {
        assert_eq!(Element::H.max_bonds(), 1);
        assert_eq!(Element::C.max_bonds(), 4);
        assert_eq!(Element::O.max_bonds(), 2);
        assert_eq!(Element::Ar.max_bonds(), 0);
    }

    #[test]
    fn test_parse_symbol_and_name() {
        assert_eq!("Cl".parse::<Element>().unwrap(), Element::Cl);
        assert_eq!("carbon".parse::<Element>().unwrap(), Element::C);
        assert!("Xx".parse::<Element>().is_err());
    }
}
