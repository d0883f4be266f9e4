//! pm_types
//!
//! Data model shared by the platemerge crates: tables, well and plate
//! identifiers, delimited IO and the structured error type.

pub mod errors;
pub mod table;
pub mod tabular;
pub mod well;

pub use errors::{AnchorKind, PlateMergeError};
pub use table::{Table, Value};
pub use well::{PlateId, WellId};

/// Plate column of every normalized table.
pub const PLATE_COL: &str = "Plate#";
/// Well column of every normalized table.
pub const WELL_COL: &str = "Well position";
/// Sample column of every normalized table.
pub const SAMPLE_COL: &str = "Sample name";

/// The identity columns, in output order.
pub const IDENTITY_COLS: [&str; 3] = [PLATE_COL, WELL_COL, SAMPLE_COL];
