//! Keyed left joins of the sample sheet with template, FCS and primer/index
//! tables.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};
use pm_types::{Table, Value, IDENTITY_COLS, PLATE_COL, SAMPLE_COL, WELL_COL};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use string_utils::TextUtils;

/// Suffix for template columns that clash with sample sheet columns.
pub const SAMPLESHEET_SUFFIX: &str = "_samplesheet";
/// Suffix for FCS columns that clash with earlier columns.
pub const FCS_SUFFIX: &str = "_fcs";
/// Suffix for primer/index columns that clash with earlier columns.
pub const PRIMER_SUFFIX: &str = "_primer";

fn key_of(row: &[Value], key_cols: &[usize]) -> Vec<String> {
    key_cols
        .iter()
        .map(|&i| row[i].render().into_owned())
        .collect()
}

/// Left join `right` onto `left` on the columns `on`.
///
/// Every left row appears exactly once, in order. For keys listed more than
/// once on the right only the first right row is used. Right columns whose
/// names are already taken get `suffix` appended.
pub fn left_join(left: &Table, right: &Table, on: &[&str], suffix: &str) -> Result<Table> {
    let left_keys = on
        .iter()
        .map(|c| left.require_column(c, "table", "join input"))
        .collect::<Result<Vec<_>>>()?;
    let right_keys = on
        .iter()
        .map(|c| right.require_column(c, "table", "join input"))
        .collect::<Result<Vec<_>>>()?;

    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut duplicates = 0;
    for (i, row) in right.rows().iter().enumerate() {
        match index.entry(key_of(row, &right_keys)) {
            Entry::Occupied(_) => duplicates += 1,
            Entry::Vacant(e) => {
                e.insert(i);
            }
        }
    }
    if duplicates > 0 {
        warn!(
            "{duplicates} rows repeat a ({}) key already seen in the joined table; using the \
             first row of each key",
            on.join(", ")
        );
    }

    let extra: Vec<usize> = (0..right.width())
        .filter(|i| !right_keys.contains(i))
        .collect();
    let mut columns = left.columns().to_vec();
    for &i in &extra {
        let mut name = right.columns()[i].clone();
        while columns.contains(&name) {
            name.push_str(suffix);
        }
        columns.push(name);
    }

    let mut matched = 0;
    let mut table = Table::new(columns);
    for row in left.rows() {
        let mut out = row.clone();
        match index.get(&key_of(row, &left_keys)) {
            Some(&r) => {
                matched += 1;
                let right_row = &right.rows()[r];
                out.extend(extra.iter().map(|&i| right_row[i].clone()));
            }
            None => out.extend(extra.iter().map(|_| Value::Null)),
        }
        table.push_row(out)?;
    }
    info!(
        "joined on ({}): {matched} of {} rows matched",
        on.join(", "),
        left.len()
    );
    Ok(table)
}

/// Broadcast the template over every plate of the sample sheet.
///
/// For each plate, in order of first appearance, the template is copied
/// with its `Plate#` set to the plate and its own `Sample name` dropped,
/// then joined with that plate's sample sheet rows on plate and well. The
/// sample sheet's `Sample name` takes the template's former column position.
pub fn broadcast_template(template: &Table, samplesheet: &Table) -> Result<Table> {
    let plate_col = samplesheet.require_column(PLATE_COL, "sample sheet", "merge input")?;
    let plates: Vec<String> = samplesheet
        .column_values(plate_col)
        .map(|v| v.render().into_owned())
        .unique()
        .collect();

    let mut base = template.clone();
    let (sample_at, _) = base
        .remove_column(SAMPLE_COL)
        .with_context(|| format!("template has no '{SAMPLE_COL}' column"))?;

    let mut per_plate = Vec::with_capacity(plates.len());
    for plate in &plates {
        let mut copy = base.clone();
        copy.fill_column(PLATE_COL, Value::from(plate.as_str()));
        per_plate.push(left_join(
            &copy,
            samplesheet,
            &[PLATE_COL, WELL_COL],
            SAMPLESHEET_SUFFIX,
        )?);
    }
    if per_plate.is_empty() {
        warn!("the sample sheet lists no plates; the template is not used");
        let mut empty = Table::new(base.columns().iter().cloned());
        empty.fill_column(PLATE_COL, Value::Null);
        empty.insert_column(sample_at, SAMPLE_COL, Vec::new())?;
        return Ok(empty);
    }

    let mut merged = Table::concat(per_plate);
    merged.move_column(SAMPLE_COL, sample_at)?;
    info!(
        "template of {} rows broadcast over {} plates",
        template.len(),
        plates.len()
    );
    Ok(merged)
}

/// Join collated FCS events onto `base` by plate, well and sample.
pub fn join_fcs(base: &Table, fcs: &Table) -> Result<Table> {
    left_join(base, fcs, &IDENTITY_COLS, FCS_SUFFIX)
}

/// Join primer/index rows onto `base` by plate, well and sample.
pub fn join_primer_index(base: &Table, primers: &Table) -> Result<Table> {
    left_join(base, primers, &IDENTITY_COLS, PRIMER_SUFFIX)
}

/// Drop columns that are entirely empty and whose name starts, ignoring
/// ASCII case, with one of `prefixes`.
pub fn strip_artifact_columns(table: &mut Table, prefixes: &[String]) -> Vec<String> {
    let dropped = table.drop_empty_columns_where(|name| {
        prefixes
            .iter()
            .any(|p| name.starts_with_ignore_case(p))
    });
    if !dropped.is_empty() {
        info!("dropped empty columns {}", dropped.join(", "));
    }
    dropped
}
