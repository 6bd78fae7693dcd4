use core::fmt;

use crate::Error;

/// Error correction level requested from a QR engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

pub type ModuleAccessor = Box<dyn Fn(usize, usize) -> bool + Send + Sync>;

/// Module matrix as an engine hands it over.
///
/// Engines expose one of three shapes: a side length with a `(row, col)` accessor, a
/// side length with row-major flat data, or nested rows. [`RawModules::resolve`] probes
/// them in that order.
#[derive(Default)]
pub struct RawModules {
    pub size: Option<usize>,
    pub accessor: Option<ModuleAccessor>,
    pub data: Option<Vec<u8>>,
    pub rows: Option<Vec<Vec<u8>>>,
}

impl RawModules {
    pub fn from_accessor(
        size: usize,
        accessor: impl Fn(usize, usize) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            size: Some(size),
            accessor: Some(Box::new(accessor)),
            ..Self::default()
        }
    }

    pub fn from_data(size: usize, data: Vec<u8>) -> Self {
        Self {
            size: Some(size),
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn from_rows(rows: Vec<Vec<u8>>) -> Self {
        Self {
            rows: Some(rows),
            ..Self::default()
        }
    }

    /// Picks the first recognised shape.
    ///
    /// Fails with [`Error::MatrixShape`] when none matches, a shapeless matrix is never
    /// read as all light.
    pub fn resolve(self) -> Result<ModuleMatrix, Error> {
        let size = self.size.filter(|size| *size > 0);

        if let (Some(size), Some(accessor)) = (size, self.accessor.as_ref()) {
            let dark = (0..area(size)?)
                .map(|index| accessor(index / size, index % size))
                .collect();
            return Ok(ModuleMatrix { size, dark });
        }

        if let (Some(size), Some(data)) = (size, self.data.as_ref()) {
            let expected = area(size)?;
            if data.len() != expected {
                return Err(Error::MatrixShape(format!(
                    "flat data holds {} modules, expected {expected}",
                    data.len(),
                )));
            }
            let dark = data.iter().map(|module| *module != 0).collect();
            return Ok(ModuleMatrix { size, dark });
        }

        if let Some(rows) = self.rows {
            let size = rows.len();
            if size == 0 || rows.iter().any(|row| row.len() != size) {
                return Err(Error::MatrixShape("rows do not form a square".into()));
            }
            let dark = rows.into_iter().flatten().map(|module| module != 0).collect();
            return Ok(ModuleMatrix { size, dark });
        }

        Err(Error::MatrixShape(
            "cannot determine the matrix size and modules".into(),
        ))
    }
}

fn area(size: usize) -> Result<usize, Error> {
    size
        .checked_mul(size)
        .ok_or_else(|| Error::MatrixShape(format!("matrix size {size} is too large")))
}

impl fmt::Debug for RawModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawModules")
            .field("size", &self.size)
            .field("accessor", &self.accessor.as_ref().map(|_| "Fn"))
            .field("data", &self.data.as_ref().map(Vec::len))
            .field("rows", &self.rows.as_ref().map(Vec::len))
            .finish()
    }
}

/// Square module matrix, `true` is dark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleMatrix {
    size: usize,
    dark: Vec<bool>,
}

impl ModuleMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.dark[row * self.size + col]
    }
}
