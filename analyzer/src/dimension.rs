// dimension.rs — Dimension algebra and the unit table
//
// A physical dimension is a vector of exponents over the seven SI base
// dimensions plus a rational scale factor. Values are kept in lowest terms
// with a positive denominator, so structural equality is dimension equality.
//
// Base-dimension order: meter, second, mole, ampere, kelvin, candela,
// kilogram.

use std::collections::HashMap;
use std::ops::{Div, Mul};

pub const NUM_BASE_DIMENSIONS: usize = 7;

// ── Dimension ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    coefficients: [i32; NUM_BASE_DIMENSIONS],
    num: i64,
    den: i64,
}

impl Dimension {
    /// A dimension with explicit exponents and scale. The scale is reduced
    /// to lowest terms; a zero denominator is treated as one.
    pub fn new(coefficients: [i32; NUM_BASE_DIMENSIONS], num: i64, den: i64) -> Self {
        Dimension { coefficients, num, den }.reduced()
    }

    /// The neutral scalar dimension `n/1` with zero exponents.
    pub fn scalar(num: i64) -> Self {
        Dimension::new([0; NUM_BASE_DIMENSIONS], num, 1)
    }

    /// True if every base-dimension exponent is zero.
    pub fn is_scalar(&self) -> bool {
        self.coefficients.iter().all(|&c| c == 0)
    }

    pub fn coefficients(&self) -> &[i32; NUM_BASE_DIMENSIONS] {
        &self.coefficients
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }

    fn reduced(mut self) -> Self {
        if self.den == 0 {
            self.den = 1;
        }
        if self.den < 0 {
            self.num = -self.num;
            self.den = -self.den;
        }
        let g = gcd(self.num.unsigned_abs(), self.den.unsigned_abs());
        if g > 1 {
            self.num /= g as i64;
            self.den /= g as i64;
        }
        self
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        let mut coefficients = [0; NUM_BASE_DIMENSIONS];
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c = self.coefficients[i] + rhs.coefficients[i];
        }
        Dimension::new(coefficients, self.num * rhs.num, self.den * rhs.den)
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        let mut coefficients = [0; NUM_BASE_DIMENSIONS];
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c = self.coefficients[i] - rhs.coefficients[i];
        }
        Dimension::new(coefficients, self.num * rhs.den, self.den * rhs.num)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

// ── Builtin unit dimensions ─────────────────────────────────────────────────

/// Exponent vector and scale for a single unit spelling, or `None` for an
/// unrecognized spelling. Spellings follow the message-definition and
/// prior-catalog vocabulary.
fn atom_dimension(name: &str) -> Option<Dimension> {
    let (coefficients, num, den): ([i32; NUM_BASE_DIMENSIONS], i64, i64) = match name {
        "centimeter" | "cm" => ([1, 0, 0, 0, 0, 0, 0], 1, 100),
        "cm/s" => ([1, -1, 0, 0, 0, 0, 0], 1, 100),
        "cm^2" => ([2, 0, 0, 0, 0, 0, 0], 1, 10000),
        "gauss" => ([0, -2, 0, -1, 0, 0, 1], 1, 1000),
        "mgauss" => ([0, -2, 0, -1, 0, 0, 1], 1, 10000000),
        "literal" => ([0, 0, 0, 0, 0, 0, 0], 1, 1),
        "m" | "meter" => ([1, 0, 0, 0, 0, 0, 0], 1, 1),
        "m/s" | "meter/sec" => ([1, -1, 0, 0, 0, 0, 0], 1, 1),
        "m/s/s" | "meter/sec/sec" => ([1, -2, 0, 0, 0, 0, 0], 1, 1),
        "mm" => ([1, 0, 0, 0, 0, 0, 0], 1, 1000),
        "millisecond" | "milliseconds" | "ms" => ([0, 1, 0, 0, 0, 0, 0], 1, 1000),
        "s" | "sec" | "second" => ([0, 1, 0, 0, 0, 0, 0], 1, 1),
        "us" => ([0, 1, 0, 0, 0, 0, 0], 1, 1000000),
        _ => return None,
    };
    Some(Dimension::new(coefficients, num, den))
}

/// Resolve a human unit name ("meter", "meter/second", "meter^2") to its
/// dimension. Compound spellings divide on `/` and exponentiate on `^`.
/// An unrecognized spelling yields `None` rather than an error.
pub fn dimension_of(name: &str) -> Option<Dimension> {
    if let Some(d) = atom_dimension(name) {
        return Some(d);
    }

    let mut result = Dimension::scalar(1);
    for (i, part) in name.split('/').enumerate() {
        let (atom, exponent) = match part.split_once('^') {
            Some((atom, exp)) => (atom, exp.parse::<u32>().ok()?),
            None => (part, 1),
        };
        let mut d = atom_dimension(atom.trim())?;
        for _ in 1..exponent {
            d = d * atom_dimension(atom.trim())?;
        }
        result = if i == 0 { result * d } else { result / d };
    }
    Some(result)
}

// ── Unit table ──────────────────────────────────────────────────────────────

/// Dense identifier for an interned unit spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub u32);

/// Interns unit spellings to dense IDs. All allocation happens on the main
/// thread while the inputs load; workers only read.
#[derive(Debug, Default)]
pub struct UnitTable {
    name_to_id: HashMap<String, UnitId>,
    names: Vec<String>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ID for `name`, allocating the next dense ID on first
    /// encounter.
    pub fn intern(&mut self, name: &str) -> UnitId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = UnitId(self.names.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    pub fn lookup(&self, name: &str) -> Option<UnitId> {
        self.name_to_id.get(name).copied()
    }

    pub fn name_of(&self, id: UnitId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
