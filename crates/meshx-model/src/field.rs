//! Sampled fields and load-case keys.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Offset applied to a load-case key until it no longer collides.
pub const LOAD_CASE_EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldShape {
    Scalar,
    Vector,
    Tensor,
}

impl FieldShape {
    pub fn key(self) -> &'static str {
        match self {
            FieldShape::Scalar => "scalar",
            FieldShape::Vector => "vector",
            FieldShape::Tensor => "tensor",
        }
    }

    /// Components written per entity in text result files (symmetric tensors).
    pub fn components(self) -> usize {
        match self {
            FieldShape::Scalar => 1,
            FieldShape::Vector => 3,
            FieldShape::Tensor => 6,
        }
    }
}

impl Display for FieldShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldShape {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" => Ok(FieldShape::Scalar),
            "vector" => Ok(FieldShape::Vector),
            "tensor" => Ok(FieldShape::Tensor),
            other => Err(ModelError::UnknownShape(other.to_string())),
        }
    }
}

/// Second-order tensor, either in symmetric Voigt order `xx, yy, zz, xy, yz, xz`
/// or as the full row-major 3×3 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tensor {
    Symmetric([f64; 6]),
    Full([f64; 9]),
}

impl Tensor {
    pub fn to_symmetric(self) -> [f64; 6] {
        match self {
            Tensor::Symmetric(v) => v,
            Tensor::Full(m) => [m[0], m[4], m[8], m[1], m[5], m[2]],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Scalar(f64),
    Vector([f64; 3]),
    Tensor(Tensor),
}

impl FieldValue {
    pub fn shape(&self) -> FieldShape {
        match self {
            FieldValue::Scalar(_) => FieldShape::Scalar,
            FieldValue::Vector(_) => FieldShape::Vector,
            FieldValue::Tensor(_) => FieldShape::Tensor,
        }
    }

    /// Build a value of `shape` from raw components. Tensors accept 6 (symmetric)
    /// or 9 (full) components; anything else is `None`.
    pub fn from_components(shape: FieldShape, values: &[f64]) -> Option<Self> {
        match (shape, values.len()) {
            (FieldShape::Scalar, n) if n >= 1 => Some(FieldValue::Scalar(values[0])),
            (FieldShape::Vector, n) if n >= 3 => {
                Some(FieldValue::Vector([values[0], values[1], values[2]]))
            }
            (FieldShape::Tensor, 9) => {
                let mut full = [0.0; 9];
                full.copy_from_slice(values);
                Some(FieldValue::Tensor(Tensor::Full(full)))
            }
            (FieldShape::Tensor, n) if n >= 6 => {
                let mut sym = [0.0; 6];
                sym.copy_from_slice(&values[..6]);
                Some(FieldValue::Tensor(Tensor::Symmetric(sym)))
            }
            _ => None,
        }
    }

    /// Components as written to text result files.
    pub fn components(&self) -> Vec<f64> {
        match self {
            FieldValue::Scalar(v) => vec![*v],
            FieldValue::Vector(v) => v.to_vec(),
            FieldValue::Tensor(t) => t.to_symmetric().to_vec(),
        }
    }
}

/// Values of one shape keyed by node or element ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub shape: FieldShape,
    pub values: BTreeMap<i32, FieldValue>,
}

impl Field {
    pub fn new(shape: FieldShape) -> Self {
        Self {
            shape,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, id: i32, value: FieldValue) {
        self.values.insert(id, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Time step or load case label. Ordered with `total_cmp` so it can key a map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadCase(pub f64);

impl LoadCase {
    /// Bump `self` until no key in `taken` equals it. Each step is
    /// [`LOAD_CASE_EPSILON`], or the spacing of `f64` at that magnitude when larger.
    /// Non-finite labels are returned unchanged.
    pub fn unique_in<V>(self, taken: &BTreeMap<LoadCase, V>) -> LoadCase {
        let mut case = self;
        while case.0.is_finite() && taken.contains_key(&case) {
            let step = LOAD_CASE_EPSILON.max(case.0.abs() * f64::EPSILON);
            case = LoadCase(case.0 + step);
        }
        case
    }
}

impl PartialEq for LoadCase {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LoadCase {}

impl PartialOrd for LoadCase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LoadCase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Display for LoadCase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type FieldsByShape = BTreeMap<FieldShape, Field>;
pub type FieldsByCase = BTreeMap<LoadCase, Field>;
