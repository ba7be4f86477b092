/// Data layer: FITS tables and the spectrum model.
///
/// Architecture:
/// ```text
///   x1d / sx1 .fits
///        │
///        ▼
///   ┌──────────┐
///   │   fits    │  cfitsio table HDUs, scalar and vector columns
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  one extension → Association, one row → Order
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Spectrum │  Vec<Association>, each Vec<Order>
///   └──────────┘
/// ```

pub mod fits;
pub mod loader;
pub mod model;
