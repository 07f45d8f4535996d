use crate::composition::Composition;
use crate::error::{RateError, Result};
use crate::interpolator::OutOfRange;
use crate::library::Library;
use crate::nuclide::Nuclide;
use crate::rate::TabularRate;
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// Rates merged from one or more [`Library`] instances.
///
/// `RateCollection` behaves like an ordered list of [`TabularRate`] keyed by
/// canonical name. Rates keep the order in which their name first appeared.
/// When several libraries provide the same canonical name the library
/// registered last wins: its rate replaces the earlier one in place.
///
/// Rates share their tables with the source libraries through `Arc`, so the
/// collection holds no reference back to the libraries themselves.
#[derive(Debug, Clone, Default)]
pub struct RateCollection {
    /// Storage for rates in merge order
    rates: Vec<TabularRate>,
    /// canonical name -> index into `rates`
    index: HashMap<String, usize>,
}

impl RateCollection {
    /// Merge the rates of `libraries` in order
    pub fn new<'a>(libraries: impl IntoIterator<Item = &'a Library>) -> Self {
        let mut collection = RateCollection::default();
        for library in libraries {
            collection.add_library(library);
        }
        collection
    }

    /// Same as [`RateCollection::new`]
    pub fn aggregate_libraries<'a>(libraries: impl IntoIterator<Item = &'a Library>) -> Self {
        Self::new(libraries)
    }

    /// Merge one more library; its rates override any with the same name
    pub fn add_library(&mut self, library: &Library) {
        for rate in library.rates() {
            self.add_rate(rate.clone(), library.name());
        }
    }

    fn add_rate(&mut self, rate: TabularRate, source: &str) {
        match self.index.get(rate.canonical_name()) {
            Some(&idx) => {
                debug!(
                    "rate {} from library '{}' overrides an earlier definition",
                    rate.canonical_name(),
                    source
                );
                self.rates[idx] = rate;
            }
            None => {
                self.index
                    .insert(rate.canonical_name().to_string(), self.rates.len());
                self.rates.push(rate);
            }
        }
    }

    /// Rates in merge order
    pub fn get_rates(&self) -> &[TabularRate] {
        &self.rates
    }

    pub fn get_rate(&self, canonical_name: &str) -> Option<&TabularRate> {
        self.index.get(canonical_name).map(|&idx| &self.rates[idx])
    }

    /// Union of reactants and products over all rates
    pub fn get_nuclei(&self) -> BTreeSet<Nuclide> {
        self.rates
            .iter()
            .flat_map(|r| [r.reactant().clone(), r.product().clone()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabularRate> {
        self.rates.iter()
    }

    /// Abundance-weighted rate `Y(reactant) * rate(T, rho * Ye)` in mol/g/s.
    ///
    /// `rho` in g/cm^3, `temperature` in K. Fails if the reactant is not part
    /// of `composition`. Works for any rate, whether or not it belongs to a
    /// collection.
    pub fn physical_rate(
        rate: &TabularRate,
        rho: f64,
        temperature: f64,
        composition: &Composition,
    ) -> Result<f64> {
        let y = composition.molar(rate.reactant())?;
        Ok(y * rate.evaluate(temperature, rho * composition.eval_ye()))
    }

    /// Physical rate of every rate in the collection, in merge order
    pub fn evaluate_rates(
        &self,
        rho: f64,
        temperature: f64,
        composition: &Composition,
    ) -> Result<Vec<(String, f64)>> {
        self.evaluate_rates_with_hook(rho, temperature, composition, |_, _| {})
    }

    /// Like [`RateCollection::evaluate_rates`], calling `hook` for every
    /// axis clamped to a table edge.
    pub fn evaluate_rates_with_hook<F>(
        &self,
        rho: f64,
        temperature: f64,
        composition: &Composition,
        mut hook: F,
    ) -> Result<Vec<(String, f64)>>
    where
        F: FnMut(&TabularRate, &OutOfRange),
    {
        let ye = composition.eval_ye();
        let molar = composition.get_molar();
        let rhoy = rho * ye;

        let mut values = Vec::with_capacity(self.rates.len());
        for rate in &self.rates {
            let y = molar
                .get(rate.reactant())
                .copied()
                .ok_or_else(|| RateError::UnknownNuclide(rate.reactant().raw()))?;
            let (value, reports) = rate.evaluate_with_diagnostics(temperature, rhoy);
            for report in &reports {
                hook(rate, report);
            }
            values.push((rate.canonical_name().to_string(), y * value));
        }
        Ok(values)
    }
}

impl<'a> IntoIterator for &'a RateCollection {
    type Item = &'a TabularRate;
    type IntoIter = std::slice::Iter<'a, TabularRate>;

    fn into_iter(self) -> Self::IntoIter {
        self.rates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolator::Axis;
    use crate::table::TableFormat;

    fn table(offset: f64) -> String {
        format!(
            "7.0 8.0 {}\n8.0 8.0 {}\n7.0 9.0 {}\n8.0 9.0 {}\n",
            -4.0 + offset,
            -3.0 + offset,
            -2.0 + offset,
            -1.0 + offset
        )
    }

    fn library(name: &str, offset: f64, ids: &[&str]) -> Library {
        let text = table(offset);
        Library::from_sources(
            name,
            TableFormat::Compact,
            ids.iter().map(|id| (id.to_string(), text.clone())),
        )
        .unwrap()
    }

    #[test]
    fn test_merge_keeps_first_appearance_order() {
        let a = library("a", 0.0, &["al23-mg23", "f17-o17"]);
        let b = library("b", 0.0, &["o19-f19", "al23-mg23"]);
        let rc = RateCollection::new([&a, &b]);
        let names: Vec<&str> = rc.get_rates().iter().map(|r| r.canonical_name()).collect();
        assert_eq!(names, vec!["al23__mg23", "f17__o17", "o19__f19"]);
        assert_eq!(rc.len(), 3);
    }

    #[test]
    fn test_last_registered_library_wins() {
        let a = library("a", 0.0, &["al23-mg23"]);
        let b = library("b", 1.0, &["al23-mg23"]);

        let rc = RateCollection::new([&a, &b]);
        let rate = rc.get_rate("al23__mg23").unwrap();
        assert_eq!(rate.evaluate(1.0e9, 1.0e8), 10f64.powf(0.0));

        let rc = RateCollection::aggregate_libraries([&b, &a]);
        let rate = rc.get_rate("al23__mg23").unwrap();
        assert_eq!(rate.evaluate(1.0e9, 1.0e8), 10f64.powf(-1.0));
    }

    #[test]
    fn test_get_nuclei_is_union() {
        let a = library("a", 0.0, &["al23-mg23", "mg23-na23"]);
        let rc = RateCollection::new([&a]);
        let nuclei: Vec<String> = rc.get_nuclei().iter().map(|n| n.raw()).collect();
        assert_eq!(nuclei, vec!["na23", "mg23", "al23"]);
    }

    #[test]
    fn test_physical_rate_is_abundance_weighted() {
        let a = library("a", 0.0, &["al23-mg23", "mg23-na23"]);
        let rc = RateCollection::new([&a]);
        let mut comp = Composition::new(rc.get_nuclei());
        comp.set_all(1.0).unwrap();
        comp.normalize().unwrap();

        let rho = 1.2e8;
        let t = 1.5e9;
        let ye = comp.eval_ye();
        let values = rc.evaluate_rates(rho, t, &comp).unwrap();
        assert_eq!(values.len(), 2);
        for (name, value) in &values {
            let rate = rc.get_rate(name).unwrap();
            let expected = comp.molar(rate.reactant()).unwrap() * rate.evaluate(t, rho * ye);
            assert_eq!(*value, expected);
            assert_eq!(RateCollection::physical_rate(rate, rho, t, &comp).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_reactant_is_an_error() {
        let a = library("a", 0.0, &["al23-mg23"]);
        let rc = RateCollection::new([&a]);
        let comp = Composition::new(vec!["mg23".parse().unwrap()]);
        assert!(rc.evaluate_rates(1.0e8, 1.0e9, &comp).is_err());
        let rate = rc.get_rate("al23__mg23").unwrap();
        assert!(RateCollection::physical_rate(rate, 1.0e8, 1.0e9, &comp).is_err());
    }

    #[test]
    fn test_hook_sees_clamped_evaluations() {
        let a = library("a", 0.0, &["al23-mg23", "f17-o17"]);
        let rc = RateCollection::new([&a]);
        let mut comp = Composition::new(rc.get_nuclei());
        comp.set_all(1.0).unwrap();
        comp.normalize().unwrap();

        let mut seen = Vec::new();
        rc.evaluate_rates_with_hook(1.0e8, 5.0e9, &comp, |rate, report| {
            seen.push((rate.canonical_name().to_string(), report.axis));
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ("al23__mg23".to_string(), Axis::Temperature),
                ("f17__o17".to_string(), Axis::Temperature),
            ]
        );

        let mut count = 0;
        rc.evaluate_rates_with_hook(1.0e8, 5.0e8, &comp, |_, _| count += 1)
            .unwrap();
        assert_eq!(count, 0);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_shared_types_are_send_and_sync() {
        assert_send_sync::<crate::table::RateTable>();
        assert_send_sync::<TabularRate>();
        assert_send_sync::<Library>();
        assert_send_sync::<RateCollection>();
    }

    #[test]
    fn test_collection_evaluates_across_threads() {
        let a = library("a", 0.0, &["al23-mg23", "f17-o17"]);
        let rc = RateCollection::new([&a]);
        let mut comp = Composition::new(rc.get_nuclei());
        comp.set_all(1.0).unwrap();
        comp.normalize().unwrap();

        let serial = rc.evaluate_rates(1.0e8, 2.0e8, &comp).unwrap();
        let threaded = std::thread::scope(|s| {
            let handle = s.spawn(|| rc.evaluate_rates(1.0e8, 2.0e8, &comp).unwrap());
            handle.join().unwrap()
        });
        assert_eq!(serial, threaded);
    }

    #[test]
    fn test_iterate_collection() {
        let a = library("a", 0.0, &["al23-mg23", "f17-o17"]);
        let rc = RateCollection::new([&a]);
        assert_eq!(rc.iter().count(), 2);
        let mut n = 0;
        for _rate in &rc {
            n += 1;
        }
        assert_eq!(n, 2);
        assert!(!rc.is_empty());
        assert!(RateCollection::default().is_empty());
    }
}
