// Struct representing a nuclide - the key used by compositions and rates
use crate::data::{element_name, element_symbol, proton_number};
use crate::error::{RateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Immutable identifier for an isotope.
///
/// A `Nuclide` is the element symbol plus mass number, with the proton number
/// derived from the symbol. Two nuclides are equal exactly when symbol and
/// mass number agree, so the type can be used directly as a map key.
/// Ordering follows `(Z, A)`, which keeps sets of nuclides in chart order.
///
/// Parsing accepts both `"al23"` / `"Al23"` and `"23al"` / `"23Al"`, plus the
/// light-particle aliases `p`, `n`, `d`, `t` and `a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nuclide {
    /// Proton number Z (0 for the free neutron).
    z: u32,
    /// Mass number A.
    a: u32,
    /// Lowercase element symbol, e.g. "al".
    symbol: String,
}

impl Nuclide {
    /// Create a nuclide from an element symbol (any case) and mass number.
    ///
    /// The symbol `n` with `A = 1` is the free neutron; every other symbol must
    /// be a known element and `A` must be at least `Z`.
    pub fn new(symbol: impl AsRef<str>, mass_number: u32) -> Result<Self> {
        let symbol = symbol.as_ref().trim().to_ascii_lowercase();
        let invalid = || RateError::InvalidNuclide(format!("{}{}", symbol, mass_number));

        if symbol == "n" && mass_number == 1 {
            return Ok(Nuclide {
                z: 0,
                a: 1,
                symbol,
            });
        }
        let z = proton_number(&symbol).ok_or_else(invalid)?;
        if mass_number == 0 || mass_number < z {
            return Err(invalid());
        }
        Ok(Nuclide {
            z,
            a: mass_number,
            symbol,
        })
    }

    /// Lowercase element symbol (e.g. `"al"`)
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Mass number A
    pub fn mass_number(&self) -> u32 {
        self.a
    }

    /// Proton number Z
    pub fn proton_number(&self) -> u32 {
        self.z
    }

    /// Neutron number N = A - Z
    pub fn neutron_number(&self) -> u32 {
        self.a - self.z
    }

    /// English element name, e.g. `"aluminum"`; `"neutron"` for the free neutron
    pub fn element_name(&self) -> &'static str {
        element_name(self.z).unwrap_or("neutron")
    }

    /// Lowercase key form used in rate names, e.g. `"al23"`
    pub fn raw(&self) -> String {
        format!("{}{}", self.symbol, self.a)
    }
}

impl FromStr for Nuclide {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "p" => return Nuclide::new("h", 1),
            "n" => return Nuclide::new("n", 1),
            "d" => return Nuclide::new("h", 2),
            "t" => return Nuclide::new("h", 3),
            "a" => return Nuclide::new("he", 4),
            _ => {}
        }

        let invalid = || RateError::InvalidNuclide(s.to_string());
        if name.is_empty() || !name.is_ascii() {
            return Err(invalid());
        }

        // Either letters then digits ("al23") or digits then letters ("23al")
        let (symbol, digits) = if name.starts_with(|c: char| c.is_ascii_digit()) {
            let idx = name
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(invalid)?;
            (&name[idx..], &name[..idx])
        } else {
            let idx = name
                .find(|c: char| c.is_ascii_digit())
                .ok_or_else(invalid)?;
            (&name[..idx], &name[idx..])
        };

        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        let mass_number: u32 = digits.parse().map_err(|_| invalid())?;
        Nuclide::new(symbol, mass_number).map_err(|_| invalid())
    }
}

impl fmt::Display for Nuclide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match element_symbol(self.z) {
            Some(symbol) => write!(f, "{}{}", symbol, self.a),
            None => write!(f, "{}{}", self.symbol, self.a),
        }
    }
}

impl TryFrom<String> for Nuclide {
    type Error = RateError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Nuclide> for String {
    fn from(nuclide: Nuclide) -> Self {
        nuclide.raw()
    }
}
