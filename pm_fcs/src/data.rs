//! List-mode DATA segment decoding.

use anyhow::{bail, ensure, Context, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

/// Storage type of one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    F32,
    F64,
    U8,
    U16,
    U32,
    U64,
}

impl Kind {
    pub(crate) fn width(self) -> usize {
        match self {
            Kind::U8 => 1,
            Kind::U16 => 2,
            Kind::F32 | Kind::U32 => 4,
            Kind::F64 | Kind::U64 => 8,
        }
    }

    /// Kind of parameter `index` (1-based) given `$DATATYPE` and its `$PnB`.
    pub(crate) fn new(datatype: &str, bits: Option<&str>, index: usize) -> Result<Kind> {
        Ok(match datatype.to_ascii_uppercase().as_str() {
            "F" => Kind::F32,
            "D" => Kind::F64,
            "I" => {
                let bits = bits.with_context(|| format!("$P{index}B is required for integer data"))?;
                match bits.trim() {
                    "8" => Kind::U8,
                    "16" => Kind::U16,
                    "32" => Kind::U32,
                    "64" => Kind::U64,
                    other => bail!("unsupported integer width $P{index}B = {other}"),
                }
            }
            "A" => bail!("ASCII ($DATATYPE A) data is not supported"),
            other => bail!("unknown $DATATYPE '{other}'"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

impl Endian {
    pub(crate) fn from_byteord(byteord: &str) -> Result<Endian> {
        let order: String = byteord.chars().filter(|c| !c.is_whitespace()).collect();
        match order.as_str() {
            "1,2,3,4" | "1,2" | "1,2,3,4,5,6,7,8" => Ok(Endian::Little),
            "4,3,2,1" | "2,1" | "8,7,6,5,4,3,2,1" => Ok(Endian::Big),
            _ => bail!("unsupported $BYTEORD '{byteord}'"),
        }
    }
}

/// `f32` values are widened through their shortest decimal form, so 0.1f32
/// becomes 0.1 rather than 0.10000000149011612.
fn widen(v: f32) -> f64 {
    if v.is_finite() {
        v.to_string().parse().unwrap_or(f64::from(v))
    } else {
        f64::from(v)
    }
}

fn read_value<B: ByteOrder>(rdr: &mut &[u8], kind: Kind) -> std::io::Result<f64> {
    Ok(match kind {
        Kind::F32 => widen(rdr.read_f32::<B>()?),
        Kind::F64 => rdr.read_f64::<B>()?,
        Kind::U8 => f64::from(rdr.read_u8()?),
        Kind::U16 => f64::from(rdr.read_u16::<B>()?),
        Kind::U32 => f64::from(rdr.read_u32::<B>()?),
        Kind::U64 => rdr.read_u64::<B>()? as f64,
    })
}

fn decode<B: ByteOrder>(data: &[u8], kinds: &[Kind], events: usize) -> Result<Vec<Vec<f64>>> {
    let mut rdr = data;
    let mut rows = Vec::with_capacity(events);
    for event in 0..events {
        let row = kinds
            .iter()
            .map(|&kind| read_value::<B>(&mut rdr, kind))
            .collect::<std::io::Result<Vec<f64>>>()
            .with_context(|| format!("reading event {event}"))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Decode `events` rows of `kinds` from `data`. `events` of None means as
/// many whole rows as the segment holds.
pub(crate) fn decode_events(
    data: &[u8],
    kinds: &[Kind],
    endian: Endian,
    events: Option<usize>,
) -> Result<Vec<Vec<f64>>> {
    let row_bytes: usize = kinds.iter().map(|k| k.width()).sum();
    if row_bytes == 0 {
        return Ok(Vec::new());
    }
    let events = events.unwrap_or(data.len() / row_bytes);
    ensure!(
        data.len() >= events * row_bytes,
        "DATA segment holds {} bytes but {events} events of {row_bytes} bytes were declared",
        data.len()
    );
    match endian {
        Endian::Little => decode::<LittleEndian>(data, kinds, events),
        Endian::Big => decode::<BigEndian>(data, kinds, events),
    }
}
