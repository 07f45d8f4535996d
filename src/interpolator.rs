// Bilinear log-space interpolation of rate tables
use crate::table::{Quantity, RateTable};
use crate::utilities::{lerp, locate, AxisPosition, Clamp};
use log::debug;
use serde::Serialize;

/// Grid axis of a rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    Temperature,
    RhoY,
}

/// Report of a query coordinate that fell outside the table and was clamped.
///
/// `value`, `min` and `max` are in physical units (K for temperature,
/// g/cm^3 for rhoY).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutOfRange {
    pub axis: Axis,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Every quantity of a table interpolated at one (T, rhoY) point, in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TableEntries {
    /// Transition rate (1/s)
    pub rate: f64,
    /// Neutrino energy loss rate (erg/s)
    pub nu_loss: Option<f64>,
    /// Gamma energy deposition rate (erg/s)
    pub gamma_energy: Option<f64>,
    /// Electron chemical potential (erg)
    pub mu: Option<f64>,
    pub dq: Option<f64>,
    pub vs: Option<f64>,
}

/// Position of a query on both axes of a table
#[derive(Debug, Clone, Copy)]
struct Stencil {
    t: AxisPosition,
    r: AxisPosition,
    t_clamp: Clamp,
    r_clamp: Clamp,
}

/// Evaluates a [`RateTable`] at arbitrary (T, rhoY) points.
///
/// Query coordinates are mapped to `x = log10(T)`, `y = log10(rhoY)` and each
/// axis is searched independently. Values are interpolated bilinearly in the
/// table's stored units, so logarithmic quantities are interpolated in log10
/// and converted back with `10^v`.
///
/// Edge policy: coordinates outside the grid are clamped to the nearest edge
/// grid line, which gives flat extrapolation beyond the table. A coordinate on
/// a grid line reduces the interpolation to one dimension, and a query on a
/// lattice point returns the stored value exactly.
#[derive(Debug, Clone, Copy)]
pub struct TabularInterpolator<'a> {
    table: &'a RateTable,
}

impl<'a> TabularInterpolator<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        TabularInterpolator { table }
    }

    pub fn table(&self) -> &'a RateTable {
        self.table
    }

    fn stencil(&self, temperature: f64, rhoy: f64) -> Stencil {
        let (t, t_clamp) = locate(self.table.log_temperature(), temperature.log10());
        let (r, r_clamp) = locate(self.table.log_rhoy(), rhoy.log10());
        Stencil {
            t,
            r,
            t_clamp,
            r_clamp,
        }
    }

    /// Interpolate along rhoY at temperature index `it`, in stored units
    fn along_rhoy(&self, it: usize, r: AxisPosition, slot: usize) -> f64 {
        match r {
            AxisPosition::Node(ir) => self.table.stored(it, ir, slot),
            AxisPosition::Interval { lo, frac } => lerp(
                self.table.stored(it, lo, slot),
                self.table.stored(it, lo + 1, slot),
                frac,
            ),
        }
    }

    /// Interpolated value of storage slot `slot`, in stored units
    fn interpolate_slot(&self, stencil: &Stencil, slot: usize) -> f64 {
        match stencil.t {
            AxisPosition::Node(it) => self.along_rhoy(it, stencil.r, slot),
            AxisPosition::Interval { lo, frac } => lerp(
                self.along_rhoy(lo, stencil.r, slot),
                self.along_rhoy(lo + 1, stencil.r, slot),
                frac,
            ),
        }
    }

    fn physical(&self, stencil: &Stencil, slot: usize) -> f64 {
        let value = self.interpolate_slot(stencil, slot);
        if self.table.quantities()[slot].is_logarithmic() {
            10f64.powf(value)
        } else {
            value
        }
    }

    /// Interpolated transition rate (1/s) at temperature `temperature` (K)
    /// and `rhoy` (g/cm^3). NaN inputs give NaN.
    pub fn evaluate(&self, temperature: f64, rhoy: f64) -> f64 {
        self.evaluate_quantity(Quantity::Rate, temperature, rhoy)
            .unwrap_or(f64::NAN)
    }

    /// Interpolated value of `quantity`, or `None` when the table lacks it.
    pub fn evaluate_quantity(&self, quantity: Quantity, temperature: f64, rhoy: f64) -> Option<f64> {
        let slot = self.table.quantity_index(quantity)?;
        if temperature.is_nan() || rhoy.is_nan() {
            return Some(f64::NAN);
        }
        let stencil = self.stencil(temperature, rhoy);
        Some(self.physical(&stencil, slot))
    }

    /// All quantities of the table at one point.
    pub fn evaluate_entries(&self, temperature: f64, rhoy: f64) -> TableEntries {
        let value = |q| self.evaluate_quantity(q, temperature, rhoy);
        TableEntries {
            rate: value(Quantity::Rate).unwrap_or(f64::NAN),
            nu_loss: value(Quantity::NuLoss),
            gamma_energy: value(Quantity::GammaEnergy),
            mu: value(Quantity::Mu),
            dq: value(Quantity::DQ),
            vs: value(Quantity::Vs),
        }
    }

    /// Axes on which the query would be clamped.
    pub fn out_of_range(&self, temperature: f64, rhoy: f64) -> Vec<OutOfRange> {
        if temperature.is_nan() || rhoy.is_nan() {
            return Vec::new();
        }
        let stencil = self.stencil(temperature, rhoy);
        self.clamp_reports(&stencil, temperature, rhoy)
    }

    fn clamp_reports(&self, stencil: &Stencil, temperature: f64, rhoy: f64) -> Vec<OutOfRange> {
        let mut reports = Vec::new();
        if stencil.t_clamp != Clamp::None {
            let (min, max) = self.table.temperature_bounds();
            reports.push(OutOfRange {
                axis: Axis::Temperature,
                value: temperature,
                min,
                max,
            });
        }
        if stencil.r_clamp != Clamp::None {
            let (min, max) = self.table.rhoy_bounds();
            reports.push(OutOfRange {
                axis: Axis::RhoY,
                value: rhoy,
                min,
                max,
            });
        }
        reports
    }

    /// Interpolated rate together with any clamped axes.
    pub fn evaluate_with_diagnostics(&self, temperature: f64, rhoy: f64) -> (f64, Vec<OutOfRange>) {
        if temperature.is_nan() || rhoy.is_nan() {
            return (f64::NAN, Vec::new());
        }
        let stencil = self.stencil(temperature, rhoy);
        let slot = self.table.quantity_index(Quantity::Rate).unwrap_or(0);
        let rate = self.physical(&stencil, slot);
        let reports = self.clamp_reports(&stencil, temperature, rhoy);
        for report in &reports {
            debug!(
                "clamped {:?} = {:e} to table range [{:e}, {:e}]",
                report.axis, report.value, report.min, report.max
            );
        }
        (rate, reports)
    }

    /// Temperature derivative of the interpolated rate, d(rate)/dT in 1/(s K).
    ///
    /// Inside a cell the log-rate surface is affine in `log10(T)`, so
    /// `d(rate)/dT = rate * (d log10(rate) / d log10(T)) / T`. On an interior
    /// temperature grid line the cell above is used. The derivative is zero
    /// where the temperature is clamped or the table has one temperature.
    pub fn drate_dt(&self, temperature: f64, rhoy: f64) -> f64 {
        if temperature.is_nan() || rhoy.is_nan() {
            return f64::NAN;
        }
        let stencil = self.stencil(temperature, rhoy);
        let n_t = self.table.n_temperature();
        if stencil.t_clamp != Clamp::None || n_t < 2 {
            return 0.0;
        }
        let lo = match stencil.t {
            AxisPosition::Interval { lo, .. } => lo,
            AxisPosition::Node(it) if it + 1 < n_t => it,
            AxisPosition::Node(it) => it - 1,
        };
        let slot = self.table.quantity_index(Quantity::Rate).unwrap_or(0);
        let axis = self.table.log_temperature();
        let slope = (self.along_rhoy(lo + 1, stencil.r, slot) - self.along_rhoy(lo, stencil.r, slot))
            / (axis[lo + 1] - axis[lo]);
        self.physical(&stencil, slot) * slope / temperature
    }
}
