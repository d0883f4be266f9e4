//! pm_lib
//!
//! Decoding of color-coded plate layouts and index-sorted FCS files, and
//! the keyed merge of those with sample sheets, templates and primer/index
//! sheets.

// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]
// Other warnings (as of rust 1.55)
#![deny(
    bindings_with_variant_name,
    confusable_idents,
    const_item_mutation,
    deprecated,
    drop_bounds,
    elided_lifetimes_in_paths,
    function_item_references,
    irrefutable_let_patterns,
    non_shorthand_field_patterns,
    overlapping_range_endpoints,
    renamed_and_removed_lints,
    stable_features,
    trivial_bounds,
    type_alias_bounds,
    unconditional_recursion,
    unused_comparisons,
    while_true
)]

pub mod collate;
pub mod fcs_metadata;
pub mod legend;
pub mod locator;
pub mod merge;
pub mod output;
pub mod plate_grid;
pub mod sheets;
pub mod stages;

pub use stages::Stage;
