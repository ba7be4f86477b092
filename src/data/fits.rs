//! FITS table access for 1D spectral products, on top of `fitsio` (cfitsio).
//!
//! A spectrum file is a primary HDU followed by binary-table extensions.
//! [`Table`] gives row-wise access to scalar and fixed-length vector columns
//! of one extension; [`TableWriter`] appends a new extension.

use std::path::Path;

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::tables::{ColumnDataType, ColumnDescription, ReadsCol, WritesCol};
use fitsio::FitsFile;
use thiserror::Error;

/// Errors that can occur during FITS file operations
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::errors::Error),
    #[error("HDU {hdu}: not a table extension")]
    NotTable { hdu: usize },
    #[error("HDU {hdu}: missing column '{column}'")]
    MissingColumn { hdu: usize, column: String },
    #[error("HDU {hdu}: {reason}")]
    Malformed { hdu: usize, reason: String },
}

/// Open an existing file read-only.
pub fn open(path: &Path) -> Result<FitsFile, FitsError> {
    Ok(FitsFile::open(path)?)
}

/// Create (or overwrite) a file holding only an empty primary HDU.
pub fn create(path: &Path) -> Result<FitsFile, FitsError> {
    Ok(FitsFile::create(path).overwrite().open()?)
}

/// Number of HDUs after the primary one.
pub fn extension_count(fptr: &mut FitsFile) -> Result<usize, FitsError> {
    Ok(fptr.num_hdus()?.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A column as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Values per cell.
    pub repeat: usize,
}

/// One table extension, made current in its file.
pub struct Table<'f> {
    fptr: &'f mut FitsFile,
    hdu: FitsHdu,
    index: usize,
    columns: Vec<Column>,
    num_rows: usize,
}

impl<'f> Table<'f> {
    pub fn open(fptr: &'f mut FitsFile, index: usize) -> Result<Self, FitsError> {
        let hdu = fptr.hdu(index)?;
        let (columns, num_rows) = match &hdu.info {
            HduInfo::TableInfo {
                column_descriptions,
                num_rows,
            } => (
                column_descriptions
                    .iter()
                    .map(|d| Column {
                        name: d.name.clone(),
                        repeat: d.data_type.repeat,
                    })
                    .collect(),
                *num_rows,
            ),
            _ => return Err(FitsError::NotTable { hdu: index }),
        };
        Ok(Table {
            fptr,
            hdu,
            index,
            columns,
            num_rows,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Look up a column by name, ignoring case.
    pub fn column(&self, name: &str) -> Result<Column, FitsError> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| FitsError::MissingColumn {
                hdu: self.index,
                column: name.to_string(),
            })
    }

    /// One value per row.
    pub fn read_scalars<T: ReadsCol>(&mut self, column: &Column) -> Result<Vec<T>, FitsError> {
        Ok(self.hdu.read_col(self.fptr, &column.name)?)
    }

    /// Every cell of a vector column, one `Vec` per row.
    pub fn read_cells<T: ReadsCol + Clone>(
        &mut self,
        column: &Column,
    ) -> Result<Vec<Vec<T>>, FitsError> {
        if column.repeat == 0 {
            return Ok(vec![Vec::new(); self.num_rows]);
        }
        // cfitsio carries a vector read on into the following rows, so the
        // range counts elements rather than rows.
        let total = self.num_rows * column.repeat;
        let flat: Vec<T> = self
            .hdu
            .read_col_range(self.fptr, &column.name, &(0..total))?;
        if flat.len() != total {
            return Err(FitsError::Malformed {
                hdu: self.index,
                reason: format!(
                    "column '{}' returned {} values, expected {total}",
                    column.name,
                    flat.len()
                ),
            });
        }
        Ok(flat.chunks(column.repeat).map(<[T]>::to_vec).collect())
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// A new table extension being filled column by column.
pub struct TableWriter<'f> {
    fptr: &'f mut FitsFile,
    hdu: FitsHdu,
}

impl<'f> TableWriter<'f> {
    /// Append an extension named `extname` with `(name, type, repeat)` columns.
    pub fn create(
        fptr: &'f mut FitsFile,
        extname: &str,
        columns: &[(&str, ColumnDataType, usize)],
    ) -> Result<Self, FitsError> {
        let descriptions = columns
            .iter()
            .map(|(name, typ, repeat)| {
                ColumnDescription::new(*name)
                    .with_type(typ.clone())
                    .that_repeats((*repeat).max(1))
                    .create()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let hdu = fptr.create_table(extname, &descriptions)?;
        Ok(TableWriter { fptr, hdu })
    }

    /// Write a whole column; vector cells are laid out row after row.
    pub fn write<T: WritesCol>(&mut self, name: &str, values: &[T]) -> Result<(), FitsError> {
        self.hdu.write_col(self.fptr, name, values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsio::images::{ImageDescription, ImageType};

    fn two_row_table(path: &Path) {
        let mut fptr = create(path).unwrap();
        let mut writer = TableWriter::create(
            &mut fptr,
            "SCI",
            &[("NELEM", ColumnDataType::Int, 1), ("Flux", ColumnDataType::Double, 3)],
        )
        .unwrap();
        writer.write("NELEM", &[3i32, 2]).unwrap();
        writer
            .write("Flux", &[1.0f64, 2.0, 3.0, 4.0, 5.0, 0.0])
            .unwrap();
    }

    #[test]
    fn vector_cells_split_by_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.fits");
        two_row_table(&path);

        let mut fptr = open(&path).unwrap();
        assert_eq!(extension_count(&mut fptr).unwrap(), 1);
        let mut table = Table::open(&mut fptr, 1).unwrap();
        assert_eq!(table.num_rows(), 2);

        let nelem = table.column("nelem").unwrap();
        assert_eq!(nelem.repeat, 1);
        let counts: Vec<i64> = table.read_scalars(&nelem).unwrap();
        assert_eq!(counts, vec![3, 2]);

        let flux = table.column("FLUX").unwrap();
        assert_eq!(flux.name, "Flux");
        assert_eq!(flux.repeat, 3);
        let cells: Vec<Vec<f64>> = table.read_cells(&flux).unwrap();
        assert_eq!(cells, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 0.0]]);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.fits");
        two_row_table(&path);

        let mut fptr = open(&path).unwrap();
        let table = Table::open(&mut fptr, 1).unwrap();
        assert!(matches!(
            table.column("DQ"),
            Err(FitsError::MissingColumn { hdu: 1, ref column }) if column == "DQ"
        ));
    }

    #[test]
    fn image_extension_is_not_a_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.fits");
        let mut fptr = create(&path).unwrap();
        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[2, 2],
        };
        fptr.create_image("IMG", &description).unwrap();
        drop(fptr);

        let mut fptr = open(&path).unwrap();
        assert!(matches!(
            Table::open(&mut fptr, 1),
            Err(FitsError::NotTable { hdu: 1 })
        ));
    }

    #[test]
    fn non_fits_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.fits");
        std::fs::write(&path, b"definitely not a FITS file").unwrap();
        assert!(matches!(open(&path), Err(FitsError::FitsIo(_))));
    }
}
