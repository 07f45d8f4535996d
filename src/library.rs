use crate::config::Config;
use crate::error::{RateError, Result};
use crate::nuclide::Nuclide;
use crate::rate::TabularRate;
use crate::table::{RateTable, TableFormat};
use log::{info, warn};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// What to do with a table source that cannot be parsed or mapped to a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Fail the whole library on the first bad source
    #[default]
    Abort,
    /// Log the bad source and continue; name collisions still fail
    Skip,
}

/// Infer the `(reactant, product)` pair from a table identifier.
///
/// Accepted forms (directory and extension are ignored):
/// * `23al-23mg_electroncapture.dat`, `al23-mg23.dat`
/// * `al23--mg23-toki`
/// * `al23__mg23` (the canonical rate name)
///
/// The pair must be a single weak step: same mass number, proton numbers one apart.
pub fn parse_rate_identifier(identifier: &str) -> Result<(Nuclide, Nuclide)> {
    let fail = |message: &str| RateError::library_load(identifier, message);

    let path = Path::new(identifier);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(identifier)
        .to_ascii_lowercase();

    let (first, second) = if let Some((a, b)) = stem.split_once("__") {
        (a, b.split('_').next().unwrap_or(b))
    } else {
        let head = stem.split('_').next().unwrap_or(stem.as_str());
        let head = head.strip_suffix("-toki").unwrap_or(head);
        match head.split_once("--") {
            Some(pair) => pair,
            None => {
                let parts: Vec<&str> = head.split('-').collect();
                if parts.len() != 2 {
                    return Err(fail("name does not describe a 'reactant-product' pair"));
                }
                (parts[0], parts[1])
            }
        }
    };

    let reactant: Nuclide = first
        .parse()
        .map_err(|_| fail(&format!("'{}' is not a nuclide", first)))?;
    let product: Nuclide = second
        .parse()
        .map_err(|_| fail(&format!("'{}' is not a nuclide", second)))?;

    if reactant.mass_number() != product.mass_number()
        || reactant.proton_number().abs_diff(product.proton_number()) != 1
    {
        return Err(fail(&format!(
            "{} -> {} is not a single weak-interaction step",
            reactant.raw(),
            product.raw()
        )));
    }
    Ok((reactant, product))
}

/// A named set of tabulated weak rates from one vendor (e.g. Suzuki, Langanke).
///
/// Every source of the library is parsed with the same [`TableFormat`] and
/// produces one [`TabularRate`]. Canonical rate names are unique within a
/// library; a collision is a construction error.
#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    format: TableFormat,
    rates: Vec<TabularRate>,
}

impl Library {
    /// Build a library from already constructed rates
    pub fn from_rates(
        name: impl Into<String>,
        format: TableFormat,
        rates: Vec<TabularRate>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for rate in &rates {
            if !seen.insert(rate.canonical_name().to_string()) {
                return Err(RateError::library_load(
                    rate.canonical_name(),
                    "rate appears more than once in the library",
                ));
            }
        }
        Ok(Library {
            name: name.into(),
            format,
            rates,
        })
    }

    /// Build a library from `(identifier, table text)` pairs, aborting on the first bad source.
    pub fn from_sources<I, S, C>(name: impl Into<String>, format: TableFormat, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: AsRef<str>,
    {
        Self::from_sources_with_policy(name, format, sources, LoadPolicy::Abort)
    }

    /// Build a library from `(identifier, table text)` pairs with an explicit policy for bad sources.
    pub fn from_sources_with_policy<I, S, C>(
        name: impl Into<String>,
        format: TableFormat,
        sources: I,
        policy: LoadPolicy,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: AsRef<str>,
    {
        let name = name.into();
        let mut rates = Vec::new();
        let mut skipped = 0usize;

        for (identifier, content) in sources {
            let identifier = identifier.as_ref();
            match build_rate(identifier, content.as_ref(), format) {
                Ok(rate) => rates.push(rate),
                Err(err) if policy == LoadPolicy::Skip => {
                    warn!("library '{}': skipping {}", name, err);
                    skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let library = Self::from_rates(name, format, rates)?;
        info!(
            "loaded {} {} rates into library '{}' ({} skipped)",
            library.len(),
            format,
            library.name,
            skipped
        );
        Ok(library)
    }

    /// Load every table file in `dir`.
    ///
    /// Regular files with a `.dat` or `.txt` extension, or no extension, are
    /// read in file name order. Hidden files are ignored.
    pub fn load_dir(name: impl Into<String>, format: TableFormat, dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_dir_with_policy(name, format, dir, LoadPolicy::Abort)
    }

    pub fn load_dir_with_policy(
        name: impl Into<String>,
        format: TableFormat,
        dir: impl AsRef<Path>,
        policy: LoadPolicy,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| RateError::io(dir, e))?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| RateError::io(dir, e))?.path();
            if path.is_file() && is_table_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|e| RateError::io(&path, e))?;
            sources.push((path.to_string_lossy().into_owned(), content));
        }
        Self::from_sources_with_policy(name, format, sources, policy)
    }

    /// Load the library registered under `keyword` in the global [`Config`].
    pub fn from_config(keyword: &str) -> Result<Self> {
        let format: TableFormat = keyword.parse()?;
        let dir = Config::global().get_library_path(keyword).ok_or_else(|| {
            RateError::Config(format!(
                "No directory configured for library '{}'. Use Config::set_library_path or set {}",
                keyword,
                crate::config::DATA_DIR_ENV
            ))
        })?;
        Self::load_dir(format.keyword(), format, dir)
    }

    /// The Suzuki et al. electron-capture / beta-decay tables, located through [`Config`]
    pub fn suzuki() -> Result<Self> {
        Self::from_config("suzuki")
    }

    /// The Langanke & Martinez-Pinedo weak rate tables, located through [`Config`]
    pub fn langanke() -> Result<Self> {
        Self::from_config("langanke")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    pub fn rates(&self) -> &[TabularRate] {
        &self.rates
    }

    pub fn get_rate(&self, canonical_name: &str) -> Option<&TabularRate> {
        self.rates
            .iter()
            .find(|r| r.canonical_name() == canonical_name)
    }

    /// Every reactant and product of the library
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
}

fn build_rate(identifier: &str, content: &str, format: TableFormat) -> Result<TabularRate> {
    let (reactant, product) = parse_rate_identifier(identifier)?;
    let table = RateTable::parse(content, format)
        .map_err(|err| RateError::library_load(identifier, err.to_string()))?;
    Ok(TabularRate::new(reactant, product, table))
}

fn is_table_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    if hidden {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => matches!(ext.to_ascii_lowercase().as_str(), "dat" | "txt"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
7.0 8.0 -4.0
8.0 8.0 -3.0
7.0 9.0 -2.0
8.0 9.0 -1.0
";

    fn raw_pair(identifier: &str) -> (String, String) {
        let (r, p) = parse_rate_identifier(identifier).unwrap();
        (r.raw(), p.raw())
    }

    #[test]
    fn test_identifier_forms() {
        let expected = ("al23".to_string(), "mg23".to_string());
        assert_eq!(raw_pair("23al-23mg_electroncapture.dat"), expected);
        assert_eq!(raw_pair("suzuki/23Al-23Mg_electroncapture.dat"), expected);
        assert_eq!(raw_pair("al23-mg23.dat"), expected);
        assert_eq!(raw_pair("al23--mg23-toki"), expected);
        assert_eq!(raw_pair("al23__mg23"), expected);
        assert_eq!(
            raw_pair("o19-f19_betadecay.dat"),
            ("o19".to_string(), "f19".to_string())
        );
    }

    #[test]
    fn test_identifier_errors() {
        for bad in [
            "al23.dat",
            "al23-mg23-na23.dat",
            "al23-xx23.dat",
            "al23-mg24.dat",
            "al23-na23.dat",
            "",
        ] {
            let err = parse_rate_identifier(bad).unwrap_err();
            assert!(
                matches!(err, RateError::LibraryLoad { .. }),
                "'{}' gave {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_from_sources_builds_rates_in_order() {
        let lib = Library::from_sources(
            "toy",
            TableFormat::Compact,
            vec![("f17-o17.dat", TABLE), ("al23-mg23.dat", TABLE)],
        )
        .unwrap();
        assert_eq!(lib.name(), "toy");
        assert_eq!(lib.format(), TableFormat::Compact);
        let names: Vec<&str> = lib.rates().iter().map(|r| r.canonical_name()).collect();
        assert_eq!(names, vec!["f17__o17", "al23__mg23"]);
        assert!(lib.get_rate("al23__mg23").is_some());
        assert!(lib.get_rate("mg23__al23").is_none());
        assert_eq!(lib.get_nuclei().len(), 4);
    }

    #[test]
    fn test_collision_is_fatal() {
        let err = Library::from_sources(
            "toy",
            TableFormat::Compact,
            vec![("al23-mg23.dat", TABLE), ("23al-23mg_electroncapture.dat", TABLE)],
        )
        .unwrap_err();
        match err {
            RateError::LibraryLoad { identifier, .. } => assert_eq!(identifier, "al23__mg23"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_malformed_table_aborts_by_default() {
        let err = Library::from_sources(
            "toy",
            TableFormat::Compact,
            vec![("al23-mg23.dat", TABLE), ("f17-o17.dat", "7.0 8.0 x\n")],
        )
        .unwrap_err();
        match err {
            RateError::LibraryLoad { identifier, message } => {
                assert_eq!(identifier, "f17-o17.dat");
                assert!(message.contains("Malformed rate table"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_skip_policy_drops_bad_sources() {
        let lib = Library::from_sources_with_policy(
            "toy",
            TableFormat::Compact,
            vec![
                ("al23-mg23.dat", TABLE),
                ("f17-o17.dat", "7.0 8.0 x\n"),
                ("readme.dat", TABLE),
            ],
            LoadPolicy::Skip,
        )
        .unwrap();
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.rates()[0].canonical_name(), "al23__mg23");
    }

    #[test]
    fn test_skip_policy_still_rejects_collisions() {
        let result = Library::from_sources_with_policy(
            "toy",
            TableFormat::Compact,
            vec![("al23-mg23.dat", TABLE), ("al23__mg23", TABLE)],
            LoadPolicy::Skip,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_table_file_filter() {
        assert!(is_table_file(Path::new("/x/23al-23mg_electroncapture.dat")));
        assert!(is_table_file(Path::new("/x/al23--mg23-toki")));
        assert!(is_table_file(Path::new("/x/table.TXT")));
        assert!(!is_table_file(Path::new("/x/.hidden.dat")));
        assert!(!is_table_file(Path::new("/x/notes.md")));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = Library::load_dir("toy", TableFormat::Compact, "/definitely/not/here").unwrap_err();
        assert!(matches!(err, RateError::Io { .. }));
    }

    #[test]
    fn test_from_config_unknown_keyword() {
        assert!(Library::from_config("ffn").is_err());
    }
}
