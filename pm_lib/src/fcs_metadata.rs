//! Identity and well positions of index-sorted FCS files.

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use parameters_toml::{PlatePrefix, SampleNameRule};
use pm_fcs::FcsFile;
use pm_types::{PlateId, PlateMergeError, WellId};
use std::path::Path;
use string_utils::TextUtils;

const SORT_LOCATIONS_KEY: &str = "INDEX SORTING LOCATIONS";

/// Plate and sample an FCS file belongs to, taken from its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateIdentity {
    pub plate: PlateId,
    pub sample: String,
}

/// Well of every event, in acquisition order.
///
/// Locations are stored in chunks under `INDEX SORTING LOCATIONS_<n>`
/// keywords, read in numeric order of `n`. Each chunk is a `;`-separated
/// list of `x,y` pairs, 0-based, x selecting the row and y the column.
pub fn well_positions(fcs: &FcsFile) -> Result<Vec<WellId>> {
    let mut chunks = Vec::new();
    for (key, value) in fcs.keywords() {
        if !key.starts_with(SORT_LOCATIONS_KEY) {
            continue;
        }
        let index: u32 = key
            .rsplit_once('_')
            .and_then(|(_, n)| n.trim().parse().ok())
            .with_context(|| format!("keyword '{key}' has no chunk number"))?;
        chunks.push((index, value.as_str()));
    }
    chunks.sort_by_key(|&(index, _)| index);

    let mut wells = Vec::new();
    for (_, chunk) in chunks {
        for loc in chunk.split(';').map(str::trim).filter(|l| !l.is_empty()) {
            let Some((x, y)) = loc.split_once(',') else {
                bail!("sort location '{loc}' is not an x,y pair");
            };
            let x: u32 = x.trim().parse().with_context(|| format!("bad sort location '{loc}'"))?;
            let y: u32 = y.trim().parse().with_context(|| format!("bad sort location '{loc}'"))?;
            wells.push(WellId::from_sort_location(x, y)?);
        }
    }
    Ok(wells)
}

fn sample_not_found(filename: &str) -> PlateMergeError {
    PlateMergeError::SampleNotFound {
        filename: filename.to_string(),
    }
}

/// Derive plate and sample from an FCS path, trying `prefixes` in order.
///
/// The plate label runs from the first occurrence of the first matching
/// prefix to the end of the file stem; how the sample is found depends on
/// that prefix's rule.
pub fn plate_identity(path: &Path, prefixes: &[PlatePrefix]) -> Result<PlateIdentity> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;

    let Some((start, prefix)) = prefixes
        .iter()
        .find_map(|p| stem.find(p.prefix.as_str()).map(|i| (i, p)))
    else {
        bail!(PlateMergeError::PlateNotFound {
            filename: stem.to_string(),
            prefixes: prefixes.iter().map(|p| p.prefix.as_str()).join(", "),
        });
    };
    let plate = &stem[start..];

    let (plate, sample) = match &prefix.sample_rule {
        SampleNameRule::AfterPlate => {
            let mut tokens = plate.split('_');
            let plate = tokens.next().unwrap_or(plate);
            match tokens.next() {
                Some(sample) if !sample.is_empty() => (plate, sample),
                _ => bail!(sample_not_found(stem)),
            }
        }
        SampleNameRule::BetweenDelimiter { delimiter } => {
            let before_plate = &stem[..start];
            let sample = before_plate
                .after(delimiter)
                .map(|s| s.strip_suffix('_').unwrap_or(s))
                .filter(|s| !s.is_empty());
            match sample {
                Some(sample) => (plate, sample),
                None => bail!(sample_not_found(stem)),
            }
        }
    };

    Ok(PlateIdentity {
        plate: PlateId::new(plate),
        sample: sample.to_string(),
    })
}
