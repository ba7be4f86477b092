use std::path::Path;

use fitsio::tables::ColumnDataType;
use fitsio::FitsFile;
use log::debug;

use super::fits::{self, Column, FitsError, Table, TableWriter};
use super::model::{Association, Order, Spectrum};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read an x1d/sx1 style 1D spectrum file.
///
/// Expected layout:
/// * HDU 0 – primary header, no data used
/// * HDU 1..N – one binary table per association, one row per order, with the
///   columns `SPORDER`, `NELEM`, `WAVELENGTH`, `FLUX`, `ERROR` and `DQ`
///   (names matched case-insensitively)
pub fn read_spectrum(path: &Path) -> Result<Spectrum> {
    let mut fptr = fits::open(path)?;
    let extensions = fits::extension_count(&mut fptr)?;

    let mut associations = Vec::with_capacity(extensions);
    for index in 1..=extensions {
        let mut table = Table::open(&mut fptr, index)?;
        let orders = read_orders(&mut table)?;
        debug!("HDU {index}: {} order(s)", orders.len());
        associations.push(Association::new(orders)?);
    }

    Spectrum::new(path, associations)
}

fn read_orders(table: &mut Table<'_>) -> Result<Vec<Order>> {
    // SPORDER only has to exist; every row is one order.
    table.column("SPORDER")?;
    let nelem_col = table.column("NELEM")?;
    let wl_col = table.column("WAVELENGTH")?;
    let flux_col = table.column("FLUX")?;
    let err_col = table.column("ERROR")?;
    let dq_col = table.column("DQ")?;

    if table.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let counts: Vec<i64> = table.read_scalars(&nelem_col)?;
    let wavelengths: Vec<Vec<f64>> = table.read_cells(&wl_col)?;
    let fluxes: Vec<Vec<f64>> = table.read_cells(&flux_col)?;
    let errors: Vec<Vec<f64>> = table.read_cells(&err_col)?;
    let dqs: Vec<Vec<i32>> = table.read_cells(&dq_col)?;

    let hdu = table.index();
    let mut orders = Vec::with_capacity(table.num_rows());
    for (row, count) in counts.into_iter().enumerate() {
        let nelem = usize::try_from(count).map_err(|_| FitsError::Malformed {
            hdu,
            reason: format!("row {row}: NELEM={count} is negative"),
        })?;
        let trim = |cells: &[Vec<_>], col: &Column| -> std::result::Result<_, FitsError> {
            trimmed(hdu, row, nelem, &cells[row], col)
        };
        orders.push(Order::new(
            Some(nelem),
            Some(trim(&wavelengths, &wl_col)?),
            Some(trim(&fluxes, &flux_col)?),
            Some(trim(&errors, &err_col)?),
            Some(trimmed(hdu, row, nelem, &dqs[row], &dq_col)?),
        )?);
    }
    Ok(orders)
}

/// The first `nelem` values of a cell. Cells are as wide as the longest order.
fn trimmed<T: Clone>(
    hdu: usize,
    row: usize,
    nelem: usize,
    cell: &[T],
    col: &Column,
) -> std::result::Result<Vec<T>, FitsError> {
    cell.get(..nelem)
        .map(<[T]>::to_vec)
        .ok_or_else(|| FitsError::Malformed {
            hdu,
            reason: format!(
                "row {row}: NELEM={nelem} exceeds the {} values stored in column '{}'",
                cell.len(),
                col.name
            ),
        })
}

// ---------------------------------------------------------------------------
// Writer (sample data and fixtures)
// ---------------------------------------------------------------------------

/// Write `spectrum` in the layout [`read_spectrum`] expects.
pub fn write_spectrum(path: &Path, spectrum: &Spectrum) -> Result<()> {
    let mut fptr = fits::create(path)?;
    for assoc in spectrum.associations() {
        write_association(&mut fptr, assoc.orders())?;
    }
    Ok(())
}

fn write_association(fptr: &mut FitsFile, orders: &[Order]) -> Result<()> {
    let repeat = orders.iter().map(Order::nelem).max().unwrap_or(0);
    let mut table = TableWriter::create(
        fptr,
        "SCI",
        &[
            ("SPORDER", ColumnDataType::Int, 1),
            ("NELEM", ColumnDataType::Int, 1),
            ("WAVELENGTH", ColumnDataType::Double, repeat),
            ("FLUX", ColumnDataType::Float, repeat),
            ("ERROR", ColumnDataType::Float, repeat),
            ("DQ", ColumnDataType::Int, repeat),
        ],
    )?;
    if orders.is_empty() {
        return Ok(());
    }

    let width = repeat.max(1);
    let sporder: Vec<i32> = (1..=orders.len()).map(|i| i as i32).collect();
    let nelem: Vec<i32> = orders.iter().map(|o| o.nelem() as i32).collect();
    table.write("SPORDER", &sporder)?;
    table.write("NELEM", &nelem)?;
    table.write("WAVELENGTH", &padded(orders, width, |o| o.wavelengths().to_vec()))?;
    table.write(
        "FLUX",
        &padded(orders, width, |o| o.fluxes().iter().map(|&v| v as f32).collect()),
    )?;
    table.write(
        "ERROR",
        &padded(orders, width, |o| o.fluxerrs().iter().map(|&v| v as f32).collect()),
    )?;
    table.write("DQ", &padded(orders, width, |o| o.dqs().to_vec()))?;
    Ok(())
}

/// Lay the cells out row after row, zero-filled to `width`.
fn padded<T: Clone + Default>(orders: &[Order], width: usize, cell: impl Fn(&Order) -> Vec<T>) -> Vec<T> {
    orders
        .iter()
        .flat_map(|o| {
            let mut values = cell(o);
            values.resize(width, T::default());
            values
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreviewError;
    use fitsio::images::{ImageDescription, ImageType};

    fn order(nelem: usize, wl0: f64) -> Order {
        let wls: Vec<f64> = (0..nelem).map(|i| wl0 + i as f64).collect();
        let fls: Vec<f64> = (0..nelem).map(|i| 1.0 + i as f64).collect();
        Order::new(
            Some(nelem),
            Some(wls),
            Some(fls),
            Some(vec![0.5; nelem]),
            Some(vec![0; nelem]),
        )
        .unwrap()
    }

    /// One-row table with three-value cells and the given NELEM, optionally without ERROR.
    fn write_single_row(path: &Path, nelem: i32, with_error: bool) {
        let mut fptr = fits::create(path).unwrap();
        let mut columns = vec![
            ("SPORDER", ColumnDataType::Int, 1),
            ("NELEM", ColumnDataType::Int, 1),
            ("WAVELENGTH", ColumnDataType::Double, 3),
            ("FLUX", ColumnDataType::Float, 3),
            ("DQ", ColumnDataType::Int, 3),
        ];
        if with_error {
            columns.push(("ERROR", ColumnDataType::Float, 3));
        }
        let mut table = TableWriter::create(&mut fptr, "SCI", &columns).unwrap();
        table.write("SPORDER", &[1i32]).unwrap();
        table.write("NELEM", &[nelem]).unwrap();
        table.write("WAVELENGTH", &[1.0f64, 2.0, 3.0]).unwrap();
        table.write("FLUX", &[1.0f32, 1.0, 1.0]).unwrap();
        table.write("DQ", &[0i32, 0, 0]).unwrap();
        if with_error {
            table.write("ERROR", &[0.1f32, 0.1, 0.1]).unwrap();
        }
    }

    #[test]
    fn two_extensions_one_row_each() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("o6d_x1d.fits");
        let spectrum = Spectrum::new(
            &path,
            vec![
                Association::new(vec![order(4, 1500.0)]).unwrap(),
                Association::new(vec![order(6, 1600.0)]).unwrap(),
            ],
        )
        .unwrap();
        write_spectrum(&path, &spectrum).unwrap();

        let read = read_spectrum(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read.orig_file(), path.as_path());
        for (assoc, nelem) in read.associations().iter().zip([4, 6]) {
            assert_eq!(assoc.orders().len(), 1);
            let o = &assoc.orders()[0];
            assert_eq!(o.nelem(), nelem);
            assert_eq!(o.wavelengths().len(), nelem);
            assert_eq!(o.fluxes().len(), nelem);
            assert_eq!(o.fluxerrs().len(), nelem);
            assert_eq!(o.dqs().len(), nelem);
        }
        assert_eq!(read.associations()[1].orders()[0].wavelengths()[5], 1605.0);
        assert_eq!(read.associations()[1].orders()[0].fluxes()[2], 3.0);
    }

    #[test]
    fn short_orders_are_trimmed_to_nelem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echelle.fits");
        let spectrum = Spectrum::new(
            &path,
            vec![Association::new(vec![order(5, 2000.0), order(3, 1900.0), order(5, 1800.0)]).unwrap()],
        )
        .unwrap();
        write_spectrum(&path, &spectrum).unwrap();

        let read = read_spectrum(&path).unwrap();
        let orders = read.associations()[0].orders();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[1].nelem(), 3);
        assert_eq!(orders[1].wavelengths(), &[1900.0, 1901.0, 1902.0]);
        assert_eq!(orders[2].wavelengths()[0], 1800.0);
    }

    #[test]
    fn missing_column_is_structural_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fits");
        write_single_row(&path, 3, false);

        let err = read_spectrum(&path).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::Fits(FitsError::MissingColumn { hdu: 1, ref column }) if column == "ERROR"
        ));
    }

    #[test]
    fn nelem_beyond_cell_width_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlong.fits");
        write_single_row(&path, 4, true);

        let err = read_spectrum(&path).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::Fits(FitsError::Malformed { hdu: 1, ref reason })
                if reason.contains("NELEM=4 exceeds the 3 values")
        ));
    }

    #[test]
    fn negative_nelem_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("negative.fits");
        write_single_row(&path, -1, true);

        assert!(matches!(
            read_spectrum(&path),
            Err(PreviewError::Fits(FitsError::Malformed { hdu: 1, .. }))
        ));
    }

    #[test]
    fn zero_row_extension_fails_association() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.fits");
        let mut fptr = fits::create(&path).unwrap();
        write_association(&mut fptr, &[]).unwrap();
        drop(fptr);

        assert!(matches!(
            read_spectrum(&path),
            Err(PreviewError::EmptyAssociation)
        ));
    }

    #[test]
    fn non_table_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.fits");
        let mut fptr = fits::create(&path).unwrap();
        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[2, 2],
        };
        fptr.create_image("IMG", &description).unwrap();
        drop(fptr);

        assert!(matches!(
            read_spectrum(&path),
            Err(PreviewError::Fits(FitsError::NotTable { hdu: 1 }))
        ));
    }

    #[test]
    fn file_without_extensions_has_no_spectrum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primary_only.fits");
        drop(fits::create(&path).unwrap());
        assert!(matches!(read_spectrum(&path), Err(PreviewError::EmptySpectrum)));
    }
}
