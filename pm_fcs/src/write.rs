//! FCS 3.1 output: 64-bit float, little-endian list mode data.

use crate::text::write_text;
use crate::{FcsFile, HEADER_LEN};
use byteorder::{LittleEndian, WriteBytesExt};

/// Offsets above this do not fit the 8 byte HEADER fields and are only
/// given through keywords.
const MAX_HEADER_OFFSET: usize = 99_999_999;

fn is_layout_keyword(key: &str) -> bool {
    const FIXED: [&str; 12] = [
        "$BEGINANALYSIS",
        "$ENDANALYSIS",
        "$BEGINSTEXT",
        "$ENDSTEXT",
        "$BEGINDATA",
        "$ENDDATA",
        "$BYTEORD",
        "$DATATYPE",
        "$MODE",
        "$NEXTDATA",
        "$PAR",
        "$TOT",
    ];
    let key = key.to_ascii_uppercase();
    if FIXED.contains(&key.as_str()) {
        return true;
    }
    // $PnX parameter keywords are regenerated from the channels
    key.strip_prefix("$P")
        .map(|rest| {
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            digits > 0 && rest.len() == digits + 1
        })
        .unwrap_or(false)
}

impl FcsFile {
    /// Serialize as FCS 3.1. Channels and events are written as doubles;
    /// other keywords are carried over in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.events.len() * self.channels.len() * 8);
        for row in &self.events {
            for &v in row {
                // writing into a Vec cannot fail
                let _ = data.write_f64::<LittleEndian>(v);
            }
        }

        let keywords = |begin: usize, end: usize| {
            let mut kw: Vec<(String, String)> = vec![
                ("$BEGINANALYSIS".into(), "0".into()),
                ("$ENDANALYSIS".into(), "0".into()),
                ("$BEGINSTEXT".into(), "0".into()),
                ("$ENDSTEXT".into(), "0".into()),
                ("$BEGINDATA".into(), format!("{begin:020}")),
                ("$ENDDATA".into(), format!("{end:020}")),
                ("$BYTEORD".into(), "1,2,3,4".into()),
                ("$DATATYPE".into(), "D".into()),
                ("$MODE".into(), "L".into()),
                ("$NEXTDATA".into(), "0".into()),
                ("$PAR".into(), self.channels.len().to_string()),
                ("$TOT".into(), self.events.len().to_string()),
            ];
            for (i, c) in self.channels.iter().enumerate() {
                let n = i + 1;
                kw.push((format!("$P{n}B"), "64".into()));
                kw.push((format!("$P{n}E"), "0,0".into()));
                kw.push((format!("$P{n}N"), c.name.clone()));
                kw.push((format!("$P{n}R"), "262144".into()));
                if let Some(label) = &c.label {
                    kw.push((format!("$P{n}S"), label.clone()));
                }
            }
            kw.extend(
                self.keywords
                    .iter()
                    .filter(|(k, _)| !is_layout_keyword(k))
                    .cloned(),
            );
            write_text(&kw, b'/')
        };

        // offsets are zero-padded, so the TEXT length is known up front
        let text_len = keywords(0, 0).len();
        let text_start = HEADER_LEN;
        let text_end = text_start + text_len - 1;
        let (data_start, data_end) = if data.is_empty() {
            (0, 0)
        } else {
            (text_end + 1, text_end + data.len())
        };
        let text = keywords(data_start, data_end);

        let header_offset = |v: usize| if v > MAX_HEADER_OFFSET { 0 } else { v };
        let mut out = format!(
            "FCS3.1    {:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
            text_start,
            header_offset(text_end),
            header_offset(data_start),
            header_offset(data_end),
            0,
            0
        )
        .into_bytes();
        out.extend_from_slice(&text);
        out.extend_from_slice(&data);
        out
    }
}
