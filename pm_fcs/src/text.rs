//! The delimited TEXT segment: `<d>key<d>value<d>key<d>value<d>`.
//!
//! The first byte of the segment is the delimiter. A doubled delimiter
//! inside a key or value stands for one literal delimiter byte.

use anyhow::{bail, Result};

pub(crate) fn parse_text(segment: &[u8]) -> Result<Vec<(String, String)>> {
    let Some((&delim, body)) = segment.split_first() else {
        bail!("TEXT segment is empty");
    };

    let mut tokens = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        if b == delim {
            if body.get(i + 1) == Some(&delim) {
                current.push(delim);
                i += 2;
                continue;
            }
            tokens.push(String::from_utf8_lossy(&current).into_owned());
            current.clear();
        } else {
            current.push(b);
        }
        i += 1;
    }
    // some writers omit the closing delimiter
    if !current.is_empty() {
        tokens.push(String::from_utf8_lossy(&current).into_owned());
    }

    if tokens.len() % 2 != 0 {
        bail!(
            "TEXT segment holds an odd number of fields ({}); keyword '{}' has no value",
            tokens.len(),
            tokens.last().map_or("", String::as_str)
        );
    }
    Ok(tokens
        .chunks_exact(2)
        .map(|kv| (kv[0].trim().to_string(), kv[1].trim().to_string()))
        .collect())
}

pub(crate) fn write_text(keywords: &[(String, String)], delim: u8) -> Vec<u8> {
    let mut out = vec![delim];
    let mut push = |field: &str| {
        // an empty field would read back as an escaped delimiter
        let field = if field.is_empty() { " " } else { field };
        for &b in field.as_bytes() {
            out.push(b);
            if b == delim {
                out.push(delim);
            }
        }
        out.push(delim);
    };
    for (k, v) in keywords {
        push(k);
        push(v);
    }
    out
}
