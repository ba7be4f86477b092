use std::path::{Path, PathBuf};

use crate::error::{PreviewError, Result};

// ---------------------------------------------------------------------------
// Order – one spectral segment / echelle order
// ---------------------------------------------------------------------------

/// One order of an association: four parallel arrays of `nelem` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    nelem: usize,
    wavelengths: Vec<f64>,
    fluxes: Vec<f64>,
    fluxerrs: Vec<f64>,
    dqs: Vec<i32>,
}

impl Order {
    /// Build an order.  Any array left as `None` is zero-filled to `nelem`;
    /// a supplied array must hold exactly `nelem` values.
    pub fn new(
        nelem: Option<usize>,
        wavelengths: Option<Vec<f64>>,
        fluxes: Option<Vec<f64>>,
        fluxerrs: Option<Vec<f64>>,
        dqs: Option<Vec<i32>>,
    ) -> Result<Self> {
        let nelem = nelem.unwrap_or(0);
        Ok(Order {
            nelem,
            wavelengths: sized(nelem, "wavelengths", wavelengths)?,
            fluxes: sized(nelem, "fluxes", fluxes)?,
            fluxerrs: sized(nelem, "fluxerrs", fluxerrs)?,
            dqs: sized(nelem, "dqs", dqs)?,
        })
    }

    /// Pre-allocated order with all arrays zeroed.
    pub fn zeroed(nelem: usize) -> Self {
        Order {
            nelem,
            wavelengths: vec![0.0; nelem],
            fluxes: vec![0.0; nelem],
            fluxerrs: vec![0.0; nelem],
            dqs: vec![0; nelem],
        }
    }

    pub fn nelem(&self) -> usize {
        self.nelem
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn fluxes(&self) -> &[f64] {
        &self.fluxes
    }

    pub fn fluxerrs(&self) -> &[f64] {
        &self.fluxerrs
    }

    pub fn dqs(&self) -> &[i32] {
        &self.dqs
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::zeroed(0)
    }
}

fn sized<T: Clone + Default>(
    nelem: usize,
    field: &'static str,
    values: Option<Vec<T>>,
) -> Result<Vec<T>> {
    match values {
        None => Ok(vec![T::default(); nelem]),
        Some(v) if v.len() == nelem => Ok(v),
        Some(v) => Err(PreviewError::OrderLength {
            nelem,
            field,
            len: v.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Association – one exposure, made of one or more orders
// ---------------------------------------------------------------------------

/// One exposure (or one member of an association) holding its orders.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    orders: Vec<Order>,
}

impl Association {
    /// Fails with [`PreviewError::EmptyAssociation`] when `orders` is empty.
    pub fn new(orders: Vec<Order>) -> Result<Self> {
        if orders.is_empty() {
            return Err(PreviewError::EmptyAssociation);
        }
        Ok(Association { orders })
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Total number of points across all orders.
    pub fn total_points(&self) -> usize {
        self.orders.iter().map(Order::nelem).sum()
    }
}

// ---------------------------------------------------------------------------
// Spectrum – the whole file
// ---------------------------------------------------------------------------

/// A 1D spectrum file: `associations[n].orders()[m].wavelengths()` etc.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    orig_file: PathBuf,
    associations: Vec<Association>,
}

impl Spectrum {
    pub fn new(orig_file: impl Into<PathBuf>, associations: Vec<Association>) -> Result<Self> {
        if associations.is_empty() {
            return Err(PreviewError::EmptySpectrum);
        }
        Ok(Spectrum {
            orig_file: orig_file.into(),
            associations,
        })
    }

    /// Path of the file this spectrum was read from.
    pub fn orig_file(&self) -> &Path {
        &self.orig_file
    }

    /// File name without directories, used as the figure title.
    pub fn file_name(&self) -> String {
        self.orig_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.orig_file.display().to_string())
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Number of associations.
    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}
