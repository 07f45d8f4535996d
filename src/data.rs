// src/data.rs
// Static element data used to key nuclides. Only proton numbers and names
// are needed; masses and binding energies live outside this crate.
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Element symbols and lowercase English names ordered by proton number.
///
/// Entry `i` holds the element with `Z = i + 1`, so hydrogen is at index 0.
pub static ELEMENTS: [(&str, &str); 103] = [
    ("H", "hydrogen"),
    ("He", "helium"),
    ("Li", "lithium"),
    ("Be", "beryllium"),
    ("B", "boron"),
    ("C", "carbon"),
    ("N", "nitrogen"),
    ("O", "oxygen"),
    ("F", "fluorine"),
    ("Ne", "neon"),
    ("Na", "sodium"),
    ("Mg", "magnesium"),
    ("Al", "aluminum"),
    ("Si", "silicon"),
    ("P", "phosphorus"),
    ("S", "sulfur"),
    ("Cl", "chlorine"),
    ("Ar", "argon"),
    ("K", "potassium"),
    ("Ca", "calcium"),
    ("Sc", "scandium"),
    ("Ti", "titanium"),
    ("V", "vanadium"),
    ("Cr", "chromium"),
    ("Mn", "manganese"),
    ("Fe", "iron"),
    ("Co", "cobalt"),
    ("Ni", "nickel"),
    ("Cu", "copper"),
    ("Zn", "zinc"),
    ("Ga", "gallium"),
    ("Ge", "germanium"),
    ("As", "arsenic"),
    ("Se", "selenium"),
    ("Br", "bromine"),
    ("Kr", "krypton"),
    ("Rb", "rubidium"),
    ("Sr", "strontium"),
    ("Y", "yttrium"),
    ("Zr", "zirconium"),
    ("Nb", "niobium"),
    ("Mo", "molybdenum"),
    ("Tc", "technetium"),
    ("Ru", "ruthenium"),
    ("Rh", "rhodium"),
    ("Pd", "palladium"),
    ("Ag", "silver"),
    ("Cd", "cadmium"),
    ("In", "indium"),
    ("Sn", "tin"),
    ("Sb", "antimony"),
    ("Te", "tellurium"),
    ("I", "iodine"),
    ("Xe", "xenon"),
    ("Cs", "cesium"),
    ("Ba", "barium"),
    ("La", "lanthanum"),
    ("Ce", "cerium"),
    ("Pr", "praseodymium"),
    ("Nd", "neodymium"),
    ("Pm", "promethium"),
    ("Sm", "samarium"),
    ("Eu", "europium"),
    ("Gd", "gadolinium"),
    ("Tb", "terbium"),
    ("Dy", "dysprosium"),
    ("Ho", "holmium"),
    ("Er", "erbium"),
    ("Tm", "thulium"),
    ("Yb", "ytterbium"),
    ("Lu", "lutetium"),
    ("Hf", "hafnium"),
    ("Ta", "tantalum"),
    ("W", "tungsten"),
    ("Re", "rhenium"),
    ("Os", "osmium"),
    ("Ir", "iridium"),
    ("Pt", "platinum"),
    ("Au", "gold"),
    ("Hg", "mercury"),
    ("Tl", "thallium"),
    ("Pb", "lead"),
    ("Bi", "bismuth"),
    ("Po", "polonium"),
    ("At", "astatine"),
    ("Rn", "radon"),
    ("Fr", "francium"),
    ("Ra", "radium"),
    ("Ac", "actinium"),
    ("Th", "thorium"),
    ("Pa", "protactinium"),
    ("U", "uranium"),
    ("Np", "neptunium"),
    ("Pu", "plutonium"),
    ("Am", "americium"),
    ("Cm", "curium"),
    ("Bk", "berkelium"),
    ("Cf", "californium"),
    ("Es", "einsteinium"),
    ("Fm", "fermium"),
    ("Md", "mendelevium"),
    ("No", "nobelium"),
    ("Lr", "lawrencium"),
];

/// Mapping from lowercase element symbol to proton number Z.
///
/// Built from [`ELEMENTS`]; lookups should lowercase the symbol first (the
/// rate tables and canonical rate names use lowercase symbols).
pub static PROTON_NUMBERS: Lazy<HashMap<String, u32>> = Lazy::new(|| {
    ELEMENTS
        .iter()
        .enumerate()
        .map(|(idx, (symbol, _))| (symbol.to_lowercase(), idx as u32 + 1))
        .collect()
});

/// Proton number for an element symbol (case insensitive).
pub fn proton_number(symbol: &str) -> Option<u32> {
    PROTON_NUMBERS.get(&symbol.to_ascii_lowercase()).copied()
}

/// Element symbol with conventional capitalisation (e.g. `"Al"`) for a proton number.
pub fn element_symbol(z: u32) -> Option<&'static str> {
    if z == 0 {
        return None;
    }
    ELEMENTS.get(z as usize - 1).map(|(symbol, _)| *symbol)
}

/// Lowercase English element name (e.g. `"aluminum"`) for a proton number.
pub fn element_name(z: u32) -> Option<&'static str> {
    if z == 0 {
        return None;
    }
    ELEMENTS.get(z as usize - 1).map(|(_, name)| *name)
}
