use std::fmt;

/// Which anchor cell a grid scan was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// Header cell above the color legend.
    LegendStart,
    /// The `A` row label of the well grid.
    WellGridStart,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorKind::LegendStart => write!(f, "sample legend header"),
            AnchorKind::WellGridStart => write!(f, "well grid start ('A' with 1 above and to the right)"),
        }
    }
}

/// Structured failures surfaced to the front end. They travel inside
/// `anyhow::Error`; use `downcast_ref::<PlateMergeError>()` to recover them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlateMergeError {
    #[error(
        "Could not find the {anchor} in sheet '{sheet}' within rows 1-{max_row} and \
         columns 1-{max_col}."
    )]
    AnchorNotFound {
        sheet: String,
        anchor: AnchorKind,
        max_row: u32,
        max_col: u32,
    },

    #[error("The sample legend below cell {cell} in sheet '{sheet}' does not list any colors.")]
    LegendEmpty { sheet: String, cell: String },

    #[error(
        "The legend color {color} in cell {cell} of sheet '{sheet}' has no sample name \
         in the cell to its right."
    )]
    LegendNameMissing {
        sheet: String,
        cell: String,
        color: String,
    },

    #[error(
        "The legend color {color} in sheet '{sheet}' is used for both '{first}' and \
         '{second}' (cell {cell}). Every sample needs its own color."
    )]
    DuplicateLegendColor {
        sheet: String,
        cell: String,
        color: String,
        first: String,
        second: String,
    },

    #[error("Cell colour {color} in cell {cell} not found in sample lookup in sheet '{sheet}'.")]
    ColorNotInLegend {
        sheet: String,
        cell: String,
        color: String,
    },

    #[error("Cell {cell} of sheet '{sheet}' should hold a well label but contains '{found}'.")]
    WellLabelMissing {
        sheet: String,
        cell: String,
        found: String,
    },

    #[error("Well {well} appears more than once in plate '{plate}'.")]
    DuplicateWell { plate: String, well: String },

    #[error("Plate name not found in filename {filename}. Expected one of the prefixes {prefixes}.")]
    PlateNotFound { filename: String, prefixes: String },

    #[error("Sample name not found in filename {filename}.")]
    SampleNotFound { filename: String },

    #[error("{0}")]
    FormatConflict(String),

    #[error("{0}")]
    MissingPrerequisite(String),

    #[error("The {filetype} '{origin}' must contain a column named '{column}', but it was not found.")]
    MissingColumn {
        filetype: String,
        origin: String,
        column: String,
    },

    #[error("No sheet starts with '{prefix}' in the workbook {path}.")]
    SheetNotFound { path: String, prefix: String },

    #[error("No row starts with '{prefix}' in sheet '{sheet}' of {path}.")]
    HeaderRowNotFound {
        path: String,
        sheet: String,
        prefix: String,
    },

    #[error(
        "The FCS file {filename} lists {wells} index sorting locations, but holds {events} events."
    )]
    WellCountMismatch {
        filename: String,
        wells: usize,
        events: usize,
    },

    #[error("Unsupported output format '{extension}'. Please use .csv, .tsv or .xlsx.")]
    UnsupportedOutputFormat { extension: String },
}
