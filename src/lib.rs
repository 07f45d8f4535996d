mod data;
// Import the modules and re-export the types for Rust usage
mod composition;
mod config;
mod error;
mod interpolator;
mod library;
mod nuclide;
mod rate;
mod rate_collection;
mod table;
mod utilities;

pub use composition::Composition;
pub use config::{Config, IntoLibraryPaths, ACCEPTABLE_KEYWORDS, DATA_DIR_ENV};
pub use data::{element_name, element_symbol, proton_number};
pub use error::{RateError, Result};
pub use interpolator::{Axis, OutOfRange, TableEntries, TabularInterpolator};
pub use library::{parse_rate_identifier, Library, LoadPolicy};
pub use nuclide::Nuclide;
pub use rate::{canonical_name, TabularRate, WeakKind};
pub use rate_collection::RateCollection;
pub use table::{ColumnLayout, Quantity, RateTable, TableFormat};
