use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use serde::{Deserialize, Serialize};

use crate::core::errors::{JTError, JTResult};

// ------------------------------------------------------------------------------------------

/// A dense table over an ordered list of discrete dimensions.
///
/// Cells are addressed by a mixed radix index where dimension 0 is the
/// least significant digit. A potential without dimensions is a valid
/// scalar with exactly one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Potential {
    data: ArrayD<f64>,
}

/// Converts an index tuple into a flat index (dimension 0 is the least significant)
///
/// # Example
///
/// ```
/// use jtree::core::{flat_index, indices_of};
///
/// let cardinalities = [2, 3, 4];
/// assert_eq!(flat_index(&cardinalities, &[1, 2, 3]), 1 + 2 * 2 + 3 * 6);
/// assert_eq!(indices_of(&cardinalities, 23), vec![1, 2, 3]);
/// ```
#[inline]
pub fn flat_index(cardinalities: &[usize], indices: &[usize]) -> usize {
    let mut flat = 0;
    let mut radix = 1;
    for (index, cardinality) in indices.iter().zip(cardinalities) {
        flat += index * radix;
        radix *= cardinality;
    }
    flat
}

/// Converts a flat index into an index tuple (dimension 0 is the least significant)
#[inline]
pub fn indices_of(cardinalities: &[usize], mut flat: usize) -> Vec<usize> {
    cardinalities
        .iter()
        .map(|cardinality| {
            let index = flat % cardinality;
            flat /= cardinality;
            index
        })
        .collect()
}

impl Potential {
    /// Creates a potential with given cardinalities.
    ///
    /// # Arguments
    ///
    /// * `cardinalities` - Cardinality of every dimension
    /// * `data` - Flat values in mixed radix order, if omitted every cell is one
    ///
    /// # Example
    ///
    /// ```
    /// use jtree::core::Potential;
    ///
    /// let p = Potential::new(&[2, 2], Some(&[0.1, 0.2, 0.3, 0.4])).unwrap();
    /// assert_eq!(p.get(&[1, 0]), 0.2);
    /// assert_eq!(p.get(&[0, 1]), 0.3);
    /// let ones = Potential::new(&[3], None).unwrap();
    /// assert_eq!(ones.values(), vec![1.0; 3]);
    /// ```
    pub fn new(cardinalities: &[usize], data: Option<&[f64]>) -> JTResult<Self> {
        let size: usize = cardinalities.iter().product();
        let values = match data {
            Some(values) if values.len() != size => {
                return Err(JTError::DataLength {
                    cardinalities: cardinalities.to_vec(),
                    expected: size,
                    found: values.len(),
                })
            }
            Some(values) => values.to_vec(),
            None => vec![1f64; size],
        };
        let data = ArrayD::from_shape_vec(IxDyn(cardinalities).f(), values).map_err(|_| {
            JTError::DataLength {
                cardinalities: cardinalities.to_vec(),
                expected: size,
                found: size,
            }
        })?;
        Ok(Potential { data })
    }

    /// Creates a potential filled with ones
    #[inline]
    pub fn ones(cardinalities: &[usize]) -> Self {
        Potential {
            data: ArrayD::ones(IxDyn(cardinalities).f()),
        }
    }

    /// Creates a potential filled with zeros
    #[inline]
    pub fn zeros(cardinalities: &[usize]) -> Self {
        Potential {
            data: ArrayD::zeros(IxDyn(cardinalities).f()),
        }
    }

    /// Creates a potential without dimensions
    #[inline]
    pub fn scalar(value: f64) -> Self {
        let mut p = Potential::ones(&[]);
        p.data.fill(value);
        p
    }

    #[inline]
    pub fn cardinalities(&self) -> &[usize] {
        self.data.shape()
    }

    #[inline]
    pub fn num_dimensions(&self) -> usize {
        self.data.ndim()
    }

    /// Number of cells
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn get(&self, indices: &[usize]) -> f64 {
        self.data[indices]
    }

    #[inline]
    pub fn set(&mut self, indices: &[usize], value: f64) {
        self.data[indices] = value;
    }

    #[inline]
    pub fn get_flat(&self, flat: usize) -> f64 {
        let indices = indices_of(self.cardinalities(), flat);
        self.data[indices.as_slice()]
    }

    #[inline]
    pub fn set_flat(&mut self, flat: usize, value: f64) {
        let indices = indices_of(self.cardinalities(), flat);
        self.data[indices.as_slice()] = value;
    }

    /// Returns all values in mixed radix order
    #[inline]
    pub fn values(&self) -> Vec<f64> {
        // reversing the axes turns logical iteration order into dimension 0 fastest
        self.data.t().iter().copied().collect()
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    #[inline]
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Copies values of a potential with identical geometry
    pub fn assign(&mut self, other: &Potential) -> JTResult<()> {
        if self.cardinalities() != other.cardinalities() {
            return Err(JTError::InvalidMapping {
                mapping: (0..other.num_dimensions()).collect(),
                source_cardinalities: other.cardinalities().to_vec(),
                target_cardinalities: self.cardinalities().to_vec(),
            });
        }
        self.data.assign(&other.data);
        Ok(())
    }

    /// Read only view of the underlying array (axis i is dimension i)
    #[inline]
    pub fn as_array(&self) -> &ArrayD<f64> {
        &self.data
    }
}

// ------------------------------------------------------------------------------------------

// `mapping[i]` is the dimension of `larger` that dimension i of `smaller` corresponds to
fn check_mapping(smaller: &Potential, larger: &Potential, mapping: &[usize]) -> JTResult<()> {
    let invalid = || JTError::InvalidMapping {
        mapping: mapping.to_vec(),
        source_cardinalities: smaller.cardinalities().to_vec(),
        target_cardinalities: larger.cardinalities().to_vec(),
    };
    if mapping.len() != smaller.num_dimensions() {
        return Err(invalid());
    }
    for (dim, mapped) in mapping.iter().enumerate() {
        match larger.cardinalities().get(*mapped) {
            Some(cardinality) if *cardinality == smaller.cardinalities()[dim] => {}
            _ => return Err(invalid()),
        }
    }
    Ok(())
}

/// Sums a potential into a potential over a subset of its dimensions
///
/// # Arguments
///
/// * `source` - A potential to marginalize
/// * `dest` - A destination, its previous values are discarded
/// * `mapping` - `mapping[i]` is the dimension of `source` that dimension i of `dest` corresponds to
///
/// # Example
///
/// ```
/// use jtree::core::{marginalize, Potential};
///
/// let source = Potential::new(&[2, 3], Some(&[1., 2., 3., 4., 5., 6.])).unwrap();
/// let mut dest = Potential::zeros(&[3]);
/// marginalize(&source, &mut dest, &[1]).unwrap();
/// assert_eq!(dest.values(), vec![3., 7., 11.]);
/// ```
pub fn marginalize(source: &Potential, dest: &mut Potential, mapping: &[usize]) -> JTResult<()> {
    check_mapping(dest, source, mapping)?;
    if dest.num_dimensions() == 0 {
        dest.data.fill(source.sum());
        return Ok(());
    }
    dest.data.fill(0f64);
    let mut projected = vec![0usize; mapping.len()];
    for (index, value) in source.data.indexed_iter() {
        for (p, m) in projected.iter_mut().zip(mapping) {
            *p = index[*m];
        }
        dest.data[projected.as_slice()] += *value;
    }
    Ok(())
}

/// Sums out every dimension but `dim` directly into a flat array
pub fn total_marginalize(source: &Potential, out: &mut [f64], dim: usize) -> JTResult<()> {
    let cardinality = *source
        .cardinalities()
        .get(dim)
        .ok_or(JTError::OutOfRangeDimension {
            dimension: dim,
            dimensions: source.num_dimensions(),
        })?;
    if out.len() != cardinality {
        return Err(JTError::DataLength {
            cardinalities: vec![cardinality],
            expected: cardinality,
            found: out.len(),
        });
    }
    out.iter_mut().for_each(|x| *x = 0f64);
    for (index, value) in source.data.indexed_iter() {
        out[index[dim]] += *value;
    }
    Ok(())
}

/// Multiplies `target` by `numerator` and divides it by `denominator`
///
/// # Arguments
///
/// * `numerator` - An optional factor to multiply in
/// * `denominator` - An optional factor to divide out, same geometry as `numerator`
/// * `target` - A potential to update in place
/// * `mapping` - `mapping[i]` is the dimension of `target` that dimension i of the factors corresponds to
///
/// # Notes
///
/// A target cell whose denominator cell is exactly zero becomes zero.
///
/// # Example
///
/// ```
/// use jtree::core::{update, Potential};
///
/// let p = Potential::new(&[3], Some(&[0.5, 0., 2.])).unwrap();
/// let mut target = Potential::ones(&[3]);
/// update(Some(&p), Some(&p), &mut target, &[0]).unwrap();
/// assert_eq!(target.values(), vec![1., 0., 1.]);
/// ```
pub fn update(
    numerator: Option<&Potential>,
    denominator: Option<&Potential>,
    target: &mut Potential,
    mapping: &[usize],
) -> JTResult<()> {
    if let Some(numerator) = numerator {
        check_mapping(numerator, target, mapping)?;
    }
    if let Some(denominator) = denominator {
        check_mapping(denominator, target, mapping)?;
    }
    let mut projected = vec![0usize; mapping.len()];
    for (index, value) in target.data.indexed_iter_mut() {
        for (p, m) in projected.iter_mut().zip(mapping) {
            *p = index[*m];
        }
        if let Some(numerator) = numerator {
            *value *= numerator.data[projected.as_slice()];
        }
        if let Some(denominator) = denominator {
            let d = denominator.data[projected.as_slice()];
            if d == 0f64 {
                *value = 0f64;
            } else {
                *value /= d;
            }
        }
    }
    Ok(())
}

/// Single dimension version of [`update`] used when the evidence of one variable changes
pub fn update_evidence(
    numerator: &[f64],
    denominator: Option<&[f64]>,
    target: &mut Potential,
    dim: usize,
) -> JTResult<()> {
    let cardinality = *target
        .cardinalities()
        .get(dim)
        .ok_or(JTError::OutOfRangeDimension {
            dimension: dim,
            dimensions: target.num_dimensions(),
        })?;
    let lengths = std::iter::once(numerator.len()).chain(denominator.map(<[f64]>::len));
    for found in lengths {
        if found != cardinality {
            return Err(JTError::DataLength {
                cardinalities: vec![cardinality],
                expected: cardinality,
                found,
            });
        }
    }
    for (index, value) in target.data.indexed_iter_mut() {
        let state = index[dim];
        match denominator {
            Some(denominator) if denominator[state] == 0f64 => *value = 0f64,
            Some(denominator) => *value *= numerator[state] / denominator[state],
            None => *value *= numerator[state],
        }
    }
    Ok(())
}

/// Multiplies a conditional probability table into `target`
///
/// `mapping[i]` is the dimension of `target` that dimension i of `probs` corresponds to.
#[inline]
pub fn init_potential(probs: &Potential, target: &mut Potential, mapping: &[usize]) -> JTResult<()> {
    update(Some(probs), None, target, mapping)
}

/// Divides an array by its sum, an array summing to exactly zero is left untouched
///
/// # Example
///
/// ```
/// use jtree::core::normalize;
///
/// let mut x = [1., 3.];
/// normalize(&mut x);
/// assert_eq!(x, [0.25, 0.75]);
/// let mut zeros = [0., 0.];
/// normalize(&mut zeros);
/// assert_eq!(zeros, [0., 0.]);
/// ```
#[inline]
pub fn normalize(array: &mut [f64]) {
    let sum: f64 = array.iter().sum();
    if sum == 0f64 {
        return;
    }
    array.iter_mut().for_each(|x| *x /= sum);
}
