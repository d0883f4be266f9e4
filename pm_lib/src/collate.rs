//! Turn FCS files into one table of events keyed by plate and well.

use crate::fcs_metadata::{plate_identity, well_positions, PlateIdentity};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use parameters_toml::{ChannelNaming, Parameters};
use pm_fcs::{ChannelNames, FcsFile};
use pm_types::{PlateMergeError, Table, Value, IDENTITY_COLS, PLATE_COL, WELL_COL};
use std::path::Path;
use string_utils::natural_cmp;

fn channel_names(naming: ChannelNaming) -> ChannelNames {
    match naming {
        ChannelNaming::PnS => ChannelNames::PreferLabel,
        ChannelNaming::PnN => ChannelNames::Name,
    }
}

/// One row per event: `Plate#`, `Well position`, `Sample name`, then the
/// channels. Events are put in acquisition-time order before the sort
/// locations are attached, since the locations are listed in that order.
pub fn fcs_table(
    fcs: &FcsFile,
    identity: &PlateIdentity,
    origin: &str,
    params: &Parameters,
) -> Result<Table> {
    let channels = fcs.channel_names(channel_names(params.channel_naming));
    let Some(time) = channels.iter().position(|c| *c == params.time_channel) else {
        bail!(PlateMergeError::MissingColumn {
            filetype: "FCS file".to_string(),
            origin: origin.to_string(),
            column: params.time_channel.clone(),
        });
    };

    let mut events: Vec<&Vec<f64>> = fcs.events().iter().collect();
    events.sort_by(|a, b| a[time].total_cmp(&b[time]));

    let wells = well_positions(fcs).with_context(|| origin.to_string())?;
    if wells.len() != events.len() {
        bail!(PlateMergeError::WellCountMismatch {
            filename: origin.to_string(),
            wells: wells.len(),
            events: events.len(),
        });
    }

    let columns = IDENTITY_COLS
        .iter()
        .map(|c| c.to_string())
        .chain(channels);
    let mut table = Table::new(columns);
    for (well, event) in wells.iter().zip(events) {
        let mut row = vec![
            Value::from(identity.plate.as_str()),
            Value::from(well.to_string()),
            Value::from(identity.sample.as_str()),
        ];
        row.extend(event.iter().map(|&v| Value::Number(v)));
        table.push_row(row)?;
    }
    Ok(table)
}

/// Stable sort by natural plate order, then natural well order.
pub fn sort_by_plate_and_well(table: &mut Table) -> Result<()> {
    let plate = table.require_column(PLATE_COL, "table", "collated records")?;
    let well = table.require_column(WELL_COL, "table", "collated records")?;
    table.sort_rows_by(|a, b| {
        natural_cmp(&a[plate].render(), &b[plate].render())
            .then_with(|| natural_cmp(&a[well].render(), &b[well].render()))
    });
    Ok(())
}

/// Concatenate per-file tables and sort them; ties keep file order.
pub fn collate_tables(tables: Vec<Table>) -> Result<Table> {
    let mut table = Table::concat(tables);
    if table.width() == 0 {
        return Ok(Table::new(IDENTITY_COLS));
    }
    sort_by_plate_and_well(&mut table)?;
    Ok(table)
}

/// Read, identify and collate FCS files.
pub fn collate_fcs_files(paths: &[impl AsRef<Path>], params: &Parameters) -> Result<Table> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let identity = plate_identity(path, &params.plate_prefixes)?;
        let fcs = FcsFile::open(path)?;
        let table = fcs_table(&fcs, &identity, &origin, params)?;
        debug!(
            "{origin}: plate {} sample {} with {} events",
            identity.plate,
            identity.sample,
            table.len()
        );
        tables.push(table);
    }
    let table = collate_tables(tables)?;
    info!("collated {} events from {} FCS files", table.len(), paths.len());
    Ok(table)
}

/// Keep the first row of every (plate, well); returns how many were dropped.
pub fn drop_duplicate_wells(table: &mut Table) -> Result<usize> {
    let plate = table.require_column(PLATE_COL, "table", "collated records")?;
    let well = table.require_column(WELL_COL, "table", "collated records")?;
    Ok(table.drop_duplicates(&[plate, well]))
}
