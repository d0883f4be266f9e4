//! pm_fcs
//!
//! Reader for Flow Cytometry Standard (FCS 2.0, 3.0 and 3.1) list-mode
//! files. A file is a fixed ASCII HEADER followed by a delimited TEXT
//! segment of keywords and a binary DATA segment holding one row of
//! parameter values per event.
//!
//! ```text
//!  0..6    version, e.g. "FCS3.1"
//!  6..10   spaces
//! 10..58   six right-aligned ASCII offsets, 8 bytes each:
//!          TEXT start/end, DATA start/end, ANALYSIS start/end
//! ```

use anyhow::{bail, ensure, Context, Result};
use log::debug;
use std::path::Path;

mod data;
mod text;
mod write;

use data::{decode_events, Endian, Kind};
use text::parse_text;

const HEADER_LEN: usize = 58;

/// One measured parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// `$PnN`, the parameter name.
    pub name: String,
    /// `$PnS`, the optional short label.
    pub label: Option<String>,
}

impl Channel {
    pub fn new(name: impl Into<String>, label: Option<&str>) -> Channel {
        Channel {
            name: name.into(),
            label: label.map(str::to_string),
        }
    }
}

/// Which keyword names a channel column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelNames {
    /// `$PnS` where present, otherwise `$PnN`. If that leaves duplicate
    /// names, every channel uses `$PnN`.
    PreferLabel,
    /// Always `$PnN`.
    Name,
}

/// A decoded FCS file: keywords in file order, channels and event rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FcsFile {
    version: String,
    keywords: Vec<(String, String)>,
    channels: Vec<Channel>,
    events: Vec<Vec<f64>>,
}

fn parse_offset(field: &[u8]) -> Result<usize> {
    let s = std::str::from_utf8(field)?.trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse()
        .with_context(|| format!("invalid HEADER offset '{s}'"))
}

impl FcsFile {
    /// Build a file from parts; every event row must have one value per
    /// channel.
    pub fn new(
        keywords: Vec<(String, String)>,
        channels: Vec<Channel>,
        events: Vec<Vec<f64>>,
    ) -> Result<FcsFile> {
        for (i, row) in events.iter().enumerate() {
            ensure!(
                row.len() == channels.len(),
                "event {i} has {} values for {} channels",
                row.len(),
                channels.len()
            );
        }
        Ok(FcsFile {
            version: "FCS3.1".to_string(),
            keywords,
            channels,
            events,
        })
    }

    pub fn open(path: &Path) -> Result<FcsFile> {
        let bytes = std::fs::read(path).with_context(|| path.display().to_string())?;
        FcsFile::from_bytes(&bytes).with_context(|| format!("reading FCS file {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<FcsFile> {
        ensure!(
            bytes.len() >= HEADER_LEN,
            "file is {} bytes, shorter than an FCS header",
            bytes.len()
        );
        let version = String::from_utf8_lossy(&bytes[0..6]).into_owned();
        ensure!(version.starts_with("FCS"), "not an FCS file (starts with '{version}')");

        let text_start = parse_offset(&bytes[10..18])?;
        let text_end = parse_offset(&bytes[18..26])?;
        let header_data_start = parse_offset(&bytes[26..34])?;
        let header_data_end = parse_offset(&bytes[34..42])?;
        ensure!(
            text_start >= HEADER_LEN && text_start < text_end && text_end < bytes.len(),
            "TEXT segment {text_start}..={text_end} lies outside the {} byte file",
            bytes.len()
        );
        let keywords = parse_text(&bytes[text_start..=text_end])?;
        let mut file = FcsFile {
            version,
            keywords,
            channels: Vec::new(),
            events: Vec::new(),
        };

        let n_params: usize = file.required("$PAR")?.parse().context("invalid $PAR")?;
        for i in 1..=n_params {
            let name = file.required(&format!("$P{i}N"))?.to_string();
            let label = file
                .keyword(&format!("$P{i}S"))
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            file.channels.push(Channel { name, label });
        }

        if let Some(mode) = file.keyword("$MODE") {
            ensure!(mode.eq_ignore_ascii_case("L"), "only list mode data is supported, found $MODE {mode}");
        }
        let total = file
            .keyword("$TOT")
            .map(|t| t.parse::<usize>().with_context(|| format!("invalid $TOT '{t}'")))
            .transpose()?;
        if total == Some(0) || n_params == 0 {
            return Ok(file);
        }

        let datatype = file.required("$DATATYPE")?;
        let kinds = (1..=n_params)
            .map(|i| Kind::new(datatype, file.keyword(&format!("$P{i}B")), i))
            .collect::<Result<Vec<_>>>()?;
        let endian = Endian::from_byteord(file.required("$BYTEORD")?)?;

        let (data_start, data_end) = if header_data_start == 0 && header_data_end == 0 {
            (
                file.required("$BEGINDATA")?.parse::<usize>().context("invalid $BEGINDATA")?,
                file.required("$ENDDATA")?.parse::<usize>().context("invalid $ENDDATA")?,
            )
        } else {
            (header_data_start, header_data_end)
        };
        if data_end < data_start || data_end >= bytes.len() {
            bail!(
                "DATA segment {data_start}..={data_end} lies outside the {} byte file",
                bytes.len()
            );
        }

        file.events = decode_events(&bytes[data_start..=data_end], &kinds, endian, total)?;
        debug!(
            "{}: {} channels, {} events",
            file.version,
            file.channels.len(),
            file.events.len()
        );
        Ok(file)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// All TEXT keywords in file order.
    pub fn keywords(&self) -> &[(String, String)] {
        &self.keywords
    }

    /// Value of keyword `key`. Keywords are case-insensitive.
    pub fn keyword(&self, key: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.keyword(key)
            .with_context(|| format!("required keyword {key} is missing"))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Column names for the channels, in file order.
    pub fn channel_names(&self, naming: ChannelNames) -> Vec<String> {
        let names: Vec<String> = self.channels.iter().map(|c| c.name.clone()).collect();
        if naming == ChannelNames::Name {
            return names;
        }
        let labelled: Vec<String> = self
            .channels
            .iter()
            .map(|c| c.label.clone().unwrap_or_else(|| c.name.clone()))
            .collect();
        let mut seen = std::collections::HashSet::new();
        if labelled.iter().all(|n| seen.insert(n.as_str())) {
            labelled
        } else {
            names
        }
    }

    pub fn events(&self) -> &[Vec<f64>] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
