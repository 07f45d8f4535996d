use crate::interpolator::{OutOfRange, TableEntries, TabularInterpolator};
use crate::nuclide::Nuclide;
use crate::table::{Quantity, RateTable};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Direction of a weak transition, from the change in proton number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WeakKind {
    /// Z decreases by one: electron capture or positron emission
    ElectronCapture,
    /// Z increases by one: beta- decay or positron capture
    BetaDecay,
    /// Reactant and product are not one weak step apart
    Unknown,
}

/// Canonical identity of a `reactant -> product` transition, e.g. `"al23__mg23"`.
pub fn canonical_name(reactant: &Nuclide, product: &Nuclide) -> String {
    format!("{}__{}", reactant.raw(), product.raw())
}

/// A single tabulated weak transition `reactant -> product`.
///
/// The rate owns (through a shared, immutable [`Arc`]) the [`RateTable`] it
/// was parsed from. [`TabularRate::evaluate`] returns the raw tabulated
/// transition rate in 1/s; weighting by the reactant's molar abundance is done
/// by [`crate::RateCollection`].
///
/// Reactant and product are assumed to share a mass number and differ in
/// proton number by one; the constructor does not check this (libraries do).
#[derive(Debug, Clone)]
pub struct TabularRate {
    reactant: Nuclide,
    product: Nuclide,
    name: String,
    table: Arc<RateTable>,
}

impl TabularRate {
    pub fn new(reactant: Nuclide, product: Nuclide, table: impl Into<Arc<RateTable>>) -> Self {
        let name = canonical_name(&reactant, &product);
        TabularRate {
            reactant,
            product,
            name,
            table: table.into(),
        }
    }

    pub fn reactant(&self) -> &Nuclide {
        &self.reactant
    }

    pub fn product(&self) -> &Nuclide {
        &self.product
    }

    /// Stable identity of the rate, `"<reactant>__<product>"` in lowercase
    pub fn canonical_name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn kind(&self) -> WeakKind {
        if self.reactant.mass_number() != self.product.mass_number() {
            return WeakKind::Unknown;
        }
        let z_in = self.reactant.proton_number() as i64;
        let z_out = self.product.proton_number() as i64;
        match z_out - z_in {
            -1 => WeakKind::ElectronCapture,
            1 => WeakKind::BetaDecay,
            _ => WeakKind::Unknown,
        }
    }

    pub fn interpolator(&self) -> TabularInterpolator<'_> {
        TabularInterpolator::new(&self.table)
    }

    /// Tabulated transition rate (1/s) at temperature `temperature` (K) and `rhoy` (g/cm^3)
    #[inline]
    pub fn evaluate(&self, temperature: f64, rhoy: f64) -> f64 {
        self.interpolator().evaluate(temperature, rhoy)
    }

    /// Rate plus a report of every axis clamped to the table edge
    pub fn evaluate_with_diagnostics(&self, temperature: f64, rhoy: f64) -> (f64, Vec<OutOfRange>) {
        self.interpolator().evaluate_with_diagnostics(temperature, rhoy)
    }

    /// Every tabulated quantity at one point
    pub fn evaluate_entries(&self, temperature: f64, rhoy: f64) -> TableEntries {
        self.interpolator().evaluate_entries(temperature, rhoy)
    }

    /// d(rate)/dT in 1/(s K)
    pub fn drate_dt(&self, temperature: f64, rhoy: f64) -> f64 {
        self.interpolator().drate_dt(temperature, rhoy)
    }

    /// Neutrino energy loss rate (erg/s), if tabulated
    pub fn nu_loss(&self, temperature: f64, rhoy: f64) -> Option<f64> {
        self.interpolator()
            .evaluate_quantity(Quantity::NuLoss, temperature, rhoy)
    }

    /// Gamma energy deposition rate (erg/s), if tabulated
    pub fn gamma_energy(&self, temperature: f64, rhoy: f64) -> Option<f64> {
        self.interpolator()
            .evaluate_quantity(Quantity::GammaEnergy, temperature, rhoy)
    }
}

impl fmt::Display for TabularRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.reactant.raw(), self.product.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableFormat;

    fn small_table() -> RateTable {
        let text = "\
7.0 8.0 1.0e-7 0.0 0.0 -4.0 -5.0 -90.0
8.0 8.0 2.0e-7 0.0 0.0 -3.0 -4.0 -90.0
7.0 9.0 3.0e-7 0.0 0.0 -2.0 -3.0 -90.0
8.0 9.0 4.0e-7 0.0 0.0 -1.0 -2.0 -90.0
";
        RateTable::parse(text, TableFormat::Suzuki).unwrap()
    }

    fn rate(reactant: &str, product: &str) -> TabularRate {
        TabularRate::new(reactant.parse().unwrap(), product.parse().unwrap(), small_table())
    }

    #[test]
    fn test_canonical_name() {
        let r = rate("Al23", "23Mg");
        assert_eq!(r.canonical_name(), "al23__mg23");
        assert_eq!(
            r.canonical_name(),
            format!(
                "{}{}__{}{}",
                r.reactant().symbol(),
                r.reactant().mass_number(),
                r.product().symbol(),
                r.product().mass_number()
            )
        );
        assert_eq!(rate("f17", "o17").canonical_name(), "f17__o17");
    }

    #[test]
    fn test_display() {
        assert_eq!(rate("na23", "ne23").to_string(), "na23 -> ne23");
    }

    #[test]
    fn test_kind() {
        assert_eq!(rate("al23", "mg23").kind(), WeakKind::ElectronCapture);
        assert_eq!(rate("o19", "f19").kind(), WeakKind::BetaDecay);
        assert_eq!(rate("o19", "f20").kind(), WeakKind::Unknown);
        assert_eq!(rate("o19", "na19").kind(), WeakKind::Unknown);
    }

    #[test]
    fn test_evaluate_on_grid_and_between() {
        let r = rate("al23", "mg23");
        assert_eq!(r.evaluate(1.0e9, 1.0e8), 10f64.powf(-1.0));
        let mid = r.evaluate(10f64.powf(8.5), 10f64.powf(7.5));
        assert!((mid.log10() + 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_auxiliary_quantities() {
        let r = rate("al23", "mg23");
        assert_eq!(r.nu_loss(1.0e8, 1.0e7), Some(10f64.powf(-5.0)));
        assert_eq!(r.gamma_energy(1.0e8, 1.0e7), Some(10f64.powf(-90.0)));
        let entries = r.evaluate_entries(1.0e8, 1.0e8);
        assert_eq!(entries.mu, Some(2.0e-7));
    }

    #[test]
    fn test_clones_share_table() {
        let r = rate("al23", "mg23");
        let copy = r.clone();
        assert!(std::ptr::eq(r.table(), copy.table()));
    }
}
