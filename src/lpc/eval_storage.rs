//! Evaluation-point storage and the batch structure derived from it.
//!
//! Wire layout, batches in ascending id order:
//!
//! ```text
//! u32 num_batches
//! per batch: u32 id || u32 num_polys || u32 num_points
//!            || num_points x EF          (evaluation points)
//!            || num_polys x num_points x EF  (claimed values, polynomial-major)
//! ```

use alloc::{collections::BTreeMap, vec::Vec};

use p3_field::{BasedVectorSpace, PrimeField64};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::marshalling::{
    WireConfig, WireForm,
    errors::{MarshalError, MarshalResult, WireFault, WireSection},
    field::{INTEGRAL_BYTES, encode_integral, ext_bytes, read_ext_array, write_ext_array},
    reader::WireReader,
};

/// Claimed evaluations of one batch of polynomials at shared points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalBatch<EF> {
    /// Points every polynomial of the batch is evaluated at.
    pub points: Vec<EF>,
    /// Claimed values, indexed by `[polynomial][point]`.
    pub values: Vec<Vec<EF>>,
}

impl<EF> EvalBatch<EF> {
    #[must_use]
    pub const fn new(points: Vec<EF>, values: Vec<Vec<EF>>) -> Self {
        Self { points, values }
    }

    #[must_use]
    pub fn num_polys(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Checks the encoding preconditions: non-empty and rectangular.
    fn check_shape(&self) -> MarshalResult<()> {
        if self.points.is_empty() {
            return Err(MarshalError::InvalidProof("batch has no evaluation points"));
        }
        if self.values.is_empty() {
            return Err(MarshalError::InvalidProof("batch has no polynomials"));
        }
        if self.values.iter().any(|row| row.len() != self.points.len()) {
            return Err(MarshalError::InvalidProof(
                "polynomial evaluations do not match the batch points",
            ));
        }
        Ok(())
    }
}

/// Evaluation storage `z`: every batch keyed by its id.
///
/// Batches are kept ordered by id, so the layout does not depend on the order
/// in which they were inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalStorage<EF> {
    batches: BTreeMap<usize, EvalBatch<EF>>,
}

impl<EF> Default for EvalStorage<EF> {
    fn default() -> Self {
        Self {
            batches: BTreeMap::new(),
        }
    }
}

impl<EF> EvalStorage<EF> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a batch, returning the one previously stored under `id`.
    pub fn insert(&mut self, id: usize, batch: EvalBatch<EF>) -> Option<EvalBatch<EF>> {
        self.batches.insert(id, batch)
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&EvalBatch<EF>> {
        self.batches.get(&id)
    }

    /// Batches in ascending id order.
    pub fn batches(&self) -> impl Iterator<Item = (usize, &EvalBatch<EF>)> {
        self.batches.iter().map(|(&id, batch)| (id, batch))
    }

    #[must_use]
    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    /// Shorthand for [`derive_batch_descriptor`].
    #[must_use]
    pub fn batch_descriptor(&self) -> BatchDescriptor {
        derive_batch_descriptor(self)
    }
}

impl<EF> FromIterator<(usize, EvalBatch<EF>)> for EvalStorage<EF> {
    fn from_iter<I: IntoIterator<Item = (usize, EvalBatch<EF>)>>(iter: I) -> Self {
        Self {
            batches: iter.into_iter().collect(),
        }
    }
}

/// Shape of a single batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchShape {
    pub num_polys: usize,
    pub num_points: usize,
}

/// Batch structure of an [`EvalStorage`].
///
/// It is never written to the wire. The FRI codec needs it to know which
/// batches each query opens, and both sides obtain it from `z` with
/// [`derive_batch_descriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchDescriptor {
    shapes: BTreeMap<usize, BatchShape>,
}

impl BatchDescriptor {
    #[must_use]
    pub fn num_batches(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<BatchShape> {
        self.shapes.get(&id).copied()
    }

    /// Shapes in ascending batch id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, BatchShape)> + '_ {
        self.shapes.iter().map(|(&id, &shape)| (id, shape))
    }

    /// Total number of polynomials across all batches.
    #[must_use]
    pub fn total_polys(&self) -> usize {
        self.shapes.values().map(|shape| shape.num_polys).sum()
    }
}

impl FromIterator<(usize, BatchShape)> for BatchDescriptor {
    fn from_iter<I: IntoIterator<Item = (usize, BatchShape)>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}

/// Derives the batch structure of `z`.
///
/// This is the single derivation used on both the encode and the decode path.
#[must_use]
pub fn derive_batch_descriptor<EF>(z: &EvalStorage<EF>) -> BatchDescriptor {
    z.batches()
        .map(|(id, batch)| {
            (
                id,
                BatchShape {
                    num_polys: batch.num_polys(),
                    num_points: batch.num_points(),
                },
            )
        })
        .collect()
}

/// Encodes the evaluation storage.
#[instrument(skip_all, fields(batches = z.num_batches()))]
pub fn encode_eval_storage<F, EF>(z: &EvalStorage<EF>, config: &WireConfig) -> MarshalResult<WireForm>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    config.check_field::<F>()?;

    let mut out = Vec::new();
    encode_integral(&mut out, z.num_batches(), config)?;
    for (id, batch) in z.batches() {
        batch.check_shape()?;
        encode_integral(&mut out, id, config)?;
        encode_integral(&mut out, batch.num_polys(), config)?;
        encode_integral(&mut out, batch.num_points(), config)?;
        write_ext_array::<F, EF>(&mut out, &batch.points, config);
        for row in &batch.values {
            write_ext_array::<F, EF>(&mut out, row, config);
        }
    }

    debug!(bytes = out.len(), "encoded evaluation storage");
    Ok(WireForm::new(out))
}

/// Decodes the evaluation storage.
#[instrument(skip_all, fields(bytes = field.len()))]
pub fn decode_eval_storage<F, EF>(field: &[u8], config: &WireConfig) -> MarshalResult<EvalStorage<EF>>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    config.check_field::<F>()?;

    let ext = ext_bytes::<F, EF>(config);
    // Header plus at least one point and one value
    let min_batch_len = 3 * INTEGRAL_BYTES + 2 * ext;

    let mut reader = WireReader::new(field, WireSection::EvalStorage);
    let num_batches = reader.read_count(config, min_batch_len, "num_batches")?;

    let mut batches = BTreeMap::new();
    let mut previous: Option<usize> = None;
    for _ in 0..num_batches {
        let id = reader.read_u32(config, "batch_id")? as usize;
        if let Some(previous) = previous.filter(|&previous| previous >= id) {
            return Err(reader.fault(WireFault::UnorderedBatch { previous, id }));
        }
        previous = Some(id);

        let num_polys = reader.read_u32(config, "num_polys")? as usize;
        let num_points = reader.read_u32(config, "num_points")? as usize;
        if num_polys == 0 || num_points == 0 {
            return Err(reader.fault(WireFault::EmptyBatch { id }));
        }
        if num_polys
            .checked_mul(num_points)
            .and_then(|n| n.checked_add(num_points))
            .and_then(|n| n.checked_mul(ext))
            .is_none_or(|needed| needed > reader.remaining())
        {
            return Err(reader.fault(WireFault::InvalidLength { field: "batch" }));
        }

        let points = read_ext_array::<F, EF>(&mut reader, num_points, config, "points")?;
        let values = (0..num_polys)
            .map(|_| read_ext_array::<F, EF>(&mut reader, num_points, config, "values"))
            .collect::<MarshalResult<Vec<_>>>()?;
        batches.insert(id, EvalBatch { points, values });
    }
    reader.finish()?;

    Ok(EvalStorage { batches })
}
