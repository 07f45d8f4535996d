use crate::error::{RateError, Result};
use crate::nuclide::Nuclide;
use std::collections::BTreeMap;
use std::fmt;

/// Isotopic composition of a stellar plasma as mass fractions.
///
/// A `Composition` is declared over a fixed set of nuclides (usually the
/// nuclei of a [`crate::RateCollection`]) which all start at zero. Fractions
/// are then set with [`Composition::set_nuc`] or [`Composition::set_all`] and
/// rescaled with [`Composition::normalize`].
///
/// Derived quantities:
/// * molar abundance `Y = X / A`
/// * electron fraction `Ye = Σ Z/A · X`
/// * mean mass number `Abar = 1 / Σ X/A` and mean charge `Zbar = Abar · Ye`
///
/// Nuclides are kept in `(Z, A)` order so sums are evaluated in a fixed
/// order and are reproducible from run to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    mass_fractions: BTreeMap<Nuclide, f64>,
}

impl Composition {
    /// Composition over `nuclei`, every mass fraction zero
    pub fn new(nuclei: impl IntoIterator<Item = Nuclide>) -> Self {
        Composition {
            mass_fractions: nuclei.into_iter().map(|n| (n, 0.0)).collect(),
        }
    }

    /// Declare another nuclide (or overwrite an existing one) with fraction `x`
    pub fn add_nuclide(&mut self, nuclide: Nuclide, x: f64) -> Result<()> {
        check_fraction(&nuclide, x)?;
        self.mass_fractions.insert(nuclide, x);
        Ok(())
    }

    /// Set the mass fraction of a declared nuclide
    pub fn set_nuc(&mut self, nuclide: &Nuclide, x: f64) -> Result<()> {
        check_fraction(nuclide, x)?;
        let slot = self
            .mass_fractions
            .get_mut(nuclide)
            .ok_or_else(|| RateError::UnknownNuclide(nuclide.raw()))?;
        *slot = x;
        Ok(())
    }

    /// Set every declared nuclide's mass fraction to `x`
    pub fn set_all(&mut self, x: f64) -> Result<()> {
        if let Some(first) = self.mass_fractions.keys().next() {
            check_fraction(first, x)?;
        }
        for value in self.mass_fractions.values_mut() {
            *value = x;
        }
        Ok(())
    }

    /// Rescale the fractions so they sum to one
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.sum_x();
        if !(total > 0.0 && total.is_finite()) {
            return Err(RateError::EmptyComposition);
        }
        for value in self.mass_fractions.values_mut() {
            *value /= total;
        }
        Ok(())
    }

    pub fn nuclei(&self) -> impl Iterator<Item = &Nuclide> {
        self.mass_fractions.keys()
    }

    pub fn contains(&self, nuclide: &Nuclide) -> bool {
        self.mass_fractions.contains_key(nuclide)
    }

    pub fn len(&self) -> usize {
        self.mass_fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass_fractions.is_empty()
    }

    pub fn mass_fractions(&self) -> &BTreeMap<Nuclide, f64> {
        &self.mass_fractions
    }

    pub fn mass_fraction(&self, nuclide: &Nuclide) -> Result<f64> {
        self.mass_fractions
            .get(nuclide)
            .copied()
            .ok_or_else(|| RateError::UnknownNuclide(nuclide.raw()))
    }

    /// Sum of all mass fractions
    pub fn sum_x(&self) -> f64 {
        self.mass_fractions.values().sum()
    }

    /// Molar abundance Y = X / A of one nuclide
    pub fn molar(&self, nuclide: &Nuclide) -> Result<f64> {
        Ok(self.mass_fraction(nuclide)? / nuclide.mass_number() as f64)
    }

    /// Molar abundances of every nuclide
    pub fn get_molar(&self) -> BTreeMap<Nuclide, f64> {
        self.mass_fractions
            .iter()
            .map(|(n, x)| (n.clone(), x / n.mass_number() as f64))
            .collect()
    }

    /// Electron fraction Ye = Σ Z/A · X
    pub fn eval_ye(&self) -> f64 {
        self.mass_fractions
            .iter()
            .map(|(n, x)| n.proton_number() as f64 * x / n.mass_number() as f64)
            .sum()
    }

    /// Mean mass number Abar = 1 / Σ X/A
    pub fn eval_abar(&self) -> f64 {
        let inverse: f64 = self
            .mass_fractions
            .iter()
            .map(|(n, x)| x / n.mass_number() as f64)
            .sum();
        1.0 / inverse
    }

    /// Mean charge Zbar = Abar · Ye
    pub fn eval_zbar(&self) -> f64 {
        self.eval_abar() * self.eval_ye()
    }

    /// JSON object mapping nuclide names to mass fractions
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.mass_fractions)?)
    }

    /// Inverse of [`Composition::to_json`]; fractions are validated but not normalized
    pub fn from_json(json: &str) -> Result<Self> {
        let mass_fractions: BTreeMap<Nuclide, f64> = serde_json::from_str(json)?;
        for (nuclide, x) in &mass_fractions {
            check_fraction(nuclide, *x)?;
        }
        Ok(Composition { mass_fractions })
    }
}

fn check_fraction(nuclide: &Nuclide, x: f64) -> Result<()> {
    if x < 0.0 || !x.is_finite() {
        return Err(RateError::InvalidFraction {
            nuclide: nuclide.raw(),
            value: x,
        });
    }
    Ok(())
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (nuclide, x) in &self.mass_fractions {
            writeln!(f, "  X({:>6}) : {:.6e}", nuclide.to_string(), x)?;
        }
        Ok(())
    }
}
