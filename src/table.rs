// Parsed tabular weak rate data on a (log T, log rhoY) grid
use crate::error::{RateError, Result};
use crate::utilities::is_strictly_increasing;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A physical quantity stored in a rate table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    /// Transition rate (1/s), stored as log10
    Rate,
    /// Neutrino energy loss rate (erg/s), stored as log10
    NuLoss,
    /// Gamma energy deposition rate (erg/s), stored as log10
    GammaEnergy,
    /// Electron chemical potential (erg), stored linearly
    Mu,
    /// Energy correction dQ (erg), stored linearly
    DQ,
    /// Coulomb potential correction Vs (erg), stored linearly
    Vs,
}

impl Quantity {
    /// True when the table stores log10 of the quantity
    pub fn is_logarithmic(self) -> bool {
        matches!(self, Quantity::Rate | Quantity::NuLoss | Quantity::GammaEnergy)
    }
}

/// Column positions of one vendor's table rows.
///
/// `required` columns must be present on every row. `optional` trailing
/// columns are used when the first data row carries them, after which every
/// row must carry them too.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub log_rhoy: usize,
    pub log_temperature: usize,
    pub required: Vec<(Quantity, usize)>,
    pub optional: Vec<(Quantity, usize)>,
}

impl ColumnLayout {
    /// Quantities (and their columns) active for rows with `n_fields` fields
    fn resolve(&self, n_fields: usize) -> Vec<(Quantity, usize)> {
        let mut columns = self.required.clone();
        columns.extend(
            self.optional
                .iter()
                .take_while(|(_, col)| *col < n_fields)
                .copied(),
        );
        columns
    }
}

/// Supported rate table vendor formats.
///
/// The format only decides the column layout; every format is parsed by
/// [`RateTable::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// `log rhoY, log T, mu, dQ, Vs, log rate, log nu loss, log gamma energy`
    Suzuki,
    /// Same eight column layout as Suzuki
    Langanke,
    /// `log rhoY, log T, log rate [, log nu loss, log gamma energy, mu]`
    Compact,
}

impl TableFormat {
    pub fn layout(self) -> ColumnLayout {
        match self {
            TableFormat::Suzuki | TableFormat::Langanke => ColumnLayout {
                log_rhoy: 0,
                log_temperature: 1,
                required: vec![
                    (Quantity::Rate, 5),
                    (Quantity::NuLoss, 6),
                    (Quantity::GammaEnergy, 7),
                    (Quantity::Mu, 2),
                    (Quantity::DQ, 3),
                    (Quantity::Vs, 4),
                ],
                optional: vec![],
            },
            TableFormat::Compact => ColumnLayout {
                log_rhoy: 0,
                log_temperature: 1,
                required: vec![(Quantity::Rate, 2)],
                optional: vec![
                    (Quantity::NuLoss, 3),
                    (Quantity::GammaEnergy, 4),
                    (Quantity::Mu, 5),
                ],
            },
        }
    }

    /// Keyword used in configuration, e.g. `"suzuki"`
    pub fn keyword(self) -> &'static str {
        match self {
            TableFormat::Suzuki => "suzuki",
            TableFormat::Langanke => "langanke",
            TableFormat::Compact => "compact",
        }
    }
}

impl FromStr for TableFormat {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suzuki" => Ok(TableFormat::Suzuki),
            "langanke" => Ok(TableFormat::Langanke),
            "compact" => Ok(TableFormat::Compact),
            other => Err(RateError::Config(format!(
                "Unknown table format '{}'. Acceptable formats are: suzuki, langanke, compact",
                other
            ))),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One parsed rate table: a fully populated rectangular grid of records.
///
/// Axes hold log10(T) and log10(rhoY) in strictly increasing order. Records
/// are stored flat in temperature-major order, each record carrying one value
/// per entry of `quantities` in the table's native units (log10 for
/// logarithmic quantities).
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    log_temperature: Vec<f64>,
    log_rhoy: Vec<f64>,
    quantities: Vec<Quantity>,
    values: Vec<f64>,
}

struct ParsedRow {
    line: usize,
    log_temperature: f64,
    log_rhoy: f64,
    values: Vec<f64>,
}

impl RateTable {
    /// Build a table from already sorted axes and temperature-major values.
    ///
    /// `values` holds `log_temperature.len() * log_rhoy.len()` records of
    /// `quantities.len()` values each. `quantities` must contain
    /// [`Quantity::Rate`].
    pub fn from_grid(
        log_temperature: Vec<f64>,
        log_rhoy: Vec<f64>,
        quantities: Vec<Quantity>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if log_temperature.is_empty() || log_rhoy.is_empty() {
            return Err(RateError::malformed("table has an empty axis"));
        }
        if !is_strictly_increasing(&log_temperature) {
            return Err(RateError::malformed(
                "temperature axis is not strictly increasing",
            ));
        }
        if !is_strictly_increasing(&log_rhoy) {
            return Err(RateError::malformed("rhoY axis is not strictly increasing"));
        }
        if !quantities.contains(&Quantity::Rate) {
            return Err(RateError::malformed("table has no rate column"));
        }
        let unique: HashSet<Quantity> = quantities.iter().copied().collect();
        if unique.len() != quantities.len() {
            return Err(RateError::malformed("table lists a quantity twice"));
        }
        let expected = log_temperature.len() * log_rhoy.len() * quantities.len();
        if values.len() != expected {
            return Err(RateError::malformed(format!(
                "expected {} values for a {} x {} grid of {} quantities, found {}",
                expected,
                log_temperature.len(),
                log_rhoy.len(),
                quantities.len(),
                values.len()
            )));
        }
        Ok(RateTable {
            log_temperature,
            log_rhoy,
            quantities,
            values,
        })
    }

    /// Parse table text in the given vendor format.
    ///
    /// Blank lines and lines starting with `!` or `#` are ignored, as are any
    /// non-numeric lines before the first data row. Rows may come in any
    /// order but must enumerate every (T, rhoY) grid pair exactly once.
    pub fn parse(source: &str, format: TableFormat) -> Result<Self> {
        let layout = format.layout();
        let mut columns: Option<Vec<(Quantity, usize)>> = None;
        let mut rows: Vec<ParsedRow> = Vec::new();

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('!') || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if rows.is_empty() && parse_number(fields[0]).is_none() {
                debug!("skipping header line {}: {}", line_no, trimmed);
                continue;
            }

            let active = columns.get_or_insert_with(|| layout.resolve(fields.len()));
            let needed = active
                .iter()
                .map(|(_, col)| *col)
                .chain([layout.log_rhoy, layout.log_temperature])
                .max()
                .unwrap_or(0)
                + 1;
            if fields.len() < needed {
                return Err(RateError::malformed_at(
                    line_no,
                    format!("expected at least {} columns, found {}", needed, fields.len()),
                ));
            }

            let log_temperature = parse_field(&fields, layout.log_temperature, line_no)?;
            let log_rhoy = parse_field(&fields, layout.log_rhoy, line_no)?;
            let values = active
                .iter()
                .map(|(_, col)| parse_field(&fields, *col, line_no))
                .collect::<Result<Vec<f64>>>()?;
            rows.push(ParsedRow {
                line: line_no,
                log_temperature,
                log_rhoy,
                values,
            });
        }

        let columns = match columns {
            Some(columns) if !rows.is_empty() => columns,
            _ => return Err(RateError::malformed("table has no data rows")),
        };

        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert((row.log_temperature.to_bits(), row.log_rhoy.to_bits())) {
                return Err(RateError::malformed_at(
                    row.line,
                    format!(
                        "duplicate grid point (log T = {}, log rhoY = {})",
                        row.log_temperature, row.log_rhoy
                    ),
                ));
            }
        }

        let log_temperature = unique_sorted(rows.iter().map(|r| r.log_temperature));
        let log_rhoy = unique_sorted(rows.iter().map(|r| r.log_rhoy));
        let n_cells = log_temperature.len() * log_rhoy.len();
        if rows.len() != n_cells {
            return Err(RateError::malformed(format!(
                "{} rows do not form a rectangular grid of {} temperatures x {} rhoY values",
                rows.len(),
                log_temperature.len(),
                log_rhoy.len()
            )));
        }

        // Every pair is unique and the count matches, so each cell is hit once
        let nq = columns.len();
        let mut values = vec![0.0; n_cells * nq];
        for row in &rows {
            let it = axis_index(&log_temperature, row.log_temperature);
            let ir = axis_index(&log_rhoy, row.log_rhoy);
            let start = (it * log_rhoy.len() + ir) * nq;
            values[start..start + nq].copy_from_slice(&row.values);
        }

        debug!(
            "parsed {} rate table: {} temperatures x {} rhoY points, {} quantities",
            format,
            log_temperature.len(),
            log_rhoy.len(),
            nq
        );

        RateTable::from_grid(
            log_temperature,
            log_rhoy,
            columns.into_iter().map(|(q, _)| q).collect(),
            values,
        )
    }

    /// log10(T) grid coordinates
    pub fn log_temperature(&self) -> &[f64] {
        &self.log_temperature
    }

    /// log10(rhoY) grid coordinates
    pub fn log_rhoy(&self) -> &[f64] {
        &self.log_rhoy
    }

    /// Quantities held by each record, in storage order
    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn has_quantity(&self, quantity: Quantity) -> bool {
        self.quantities.contains(&quantity)
    }

    /// Storage slot of `quantity` within a record
    pub fn quantity_index(&self, quantity: Quantity) -> Option<usize> {
        self.quantities.iter().position(|q| *q == quantity)
    }

    /// Value stored at grid point `(it, ir)` for the quantity in slot `slot`,
    /// in the table's native units.
    #[inline]
    pub fn stored(&self, it: usize, ir: usize, slot: usize) -> f64 {
        self.values[(it * self.log_rhoy.len() + ir) * self.quantities.len() + slot]
    }

    /// Stored log10(rate) at grid point `(it, ir)`
    pub fn stored_log_rate(&self, it: usize, ir: usize) -> f64 {
        // Rate is always present, checked by from_grid
        let slot = self.quantity_index(Quantity::Rate).unwrap_or(0);
        self.stored(it, ir, slot)
    }

    pub fn n_temperature(&self) -> usize {
        self.log_temperature.len()
    }

    pub fn n_rhoy(&self) -> usize {
        self.log_rhoy.len()
    }

    /// Temperature range covered by the table, in K
    pub fn temperature_bounds(&self) -> (f64, f64) {
        bounds(&self.log_temperature)
    }

    /// rhoY range covered by the table, in g/cm^3
    pub fn rhoy_bounds(&self) -> (f64, f64) {
        bounds(&self.log_rhoy)
    }
}

/// Numeric value of a table field, accepting Fortran `D` exponents
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(['D', 'd'], "E").parse::<f64>().ok()
}

/// Finite value of column `col`
fn parse_field(fields: &[&str], col: usize, line_no: usize) -> Result<f64> {
    let raw = fields[col];
    let value = parse_number(raw).ok_or_else(|| {
        RateError::malformed_at(
            line_no,
            format!("cannot parse '{}' in column {} as a number", raw, col + 1),
        )
    })?;
    if !value.is_finite() {
        return Err(RateError::malformed_at(
            line_no,
            format!("non-finite value '{}' in column {}", raw, col + 1),
        ));
    }
    Ok(value)
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut axis: Vec<f64> = values.collect();
    axis.sort_by(f64::total_cmp);
    axis.dedup();
    axis
}

fn axis_index(axis: &[f64], value: f64) -> usize {
    // value was taken from the rows that built the axis, so it is present
    axis.binary_search_by(|v| v.total_cmp(&value))
        .unwrap_or_else(|idx| idx)
}

fn bounds(log_axis: &[f64]) -> (f64, f64) {
    let lo = log_axis[0];
    let hi = log_axis[log_axis.len() - 1];
    (10f64.powf(lo), 10f64.powf(hi))
}
