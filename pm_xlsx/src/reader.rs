//! Read OOXML (`.xlsx`) workbooks into `Sheet` grids, keeping each cell's
//! fill color.

use crate::sheet::{parse_cell_ref, Cell, CellValue, Fill, Sheet};
use anyhow::{bail, Context, Result};
use log::debug;
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use string_utils::TextUtils;
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

/// All worksheets of a workbook, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    origin: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Workbook> {
        let file = File::open(path).with_context(|| path.display().to_string())?;
        Workbook::from_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Read a workbook from any seekable reader; `origin` names it in errors.
    pub fn from_reader<R: Read + Seek>(rdr: R, origin: &str) -> Result<Workbook> {
        let mut archive = ZipArchive::new(rdr)
            .with_context(|| format!("{origin} is not an xlsx workbook"))?;

        let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
            .with_context(|| format!("{origin} has no {WORKBOOK_PART}"))?;
        let rels_xml = read_part(&mut archive, WORKBOOK_RELS_PART)?
            .with_context(|| format!("{origin} has no {WORKBOOK_RELS_PART}"))?;
        let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };
        let styles = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => Styles::parse(&xml)?,
            None => Styles::default(),
        };

        let targets = parse_relationships(&rels_xml)?;
        let mut sheets = Vec::new();
        for (name, rel_id) in parse_sheet_list(&workbook_xml)? {
            let Some(target) = targets.get(&rel_id) else {
                bail!("{origin}: sheet '{name}' refers to unknown relationship {rel_id}");
            };
            let part = resolve_target(target);
            let xml = read_part(&mut archive, &part)?
                .with_context(|| format!("{origin}: missing worksheet part {part}"))?;
            let sheet = parse_worksheet(&name, &xml, &shared_strings, &styles)
                .with_context(|| format!("{origin}: reading sheet '{name}'"))?;
            debug!("read sheet '{name}' from {origin}");
            sheets.push(sheet);
        }

        Ok(Workbook {
            origin: origin.to_string(),
            sheets,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    /// First sheet whose title starts with `prefix`, ignoring ASCII case.
    pub fn sheet_with_prefix(&self, prefix: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.title().starts_with_ignore_case(prefix))
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("opening {name}")),
    };
    let mut s = String::new();
    file.read_to_string(&mut s)
        .with_context(|| format!("reading {name}"))?;
    Ok(Some(s))
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None => format!("xl/{target}"),
    }
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|n| n.tag_name().name() == "Relationship")
        .filter_map(|n| Some((n.attribute("Id")?.to_string(), n.attribute("Target")?.to_string())))
        .collect())
}

/// (sheet name, relationship id) in workbook order.
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, String)>> {
    let doc = Document::parse(xml)?;
    let mut sheets = Vec::new();
    for node in doc.descendants().filter(|n| n.tag_name().name() == "sheet") {
        let name = node.attribute("name").unwrap_or_default().to_string();
        // r:id, whatever the relationships namespace is called
        let Some(rel_id) = node
            .attributes()
            .find(|a| a.name() == "id" && a.namespace().is_some())
        else {
            bail!("sheet '{name}' has no relationship id");
        };
        sheets.push((name, rel_id.value().to_string()));
    }
    Ok(sheets)
}

/// Concatenated text runs of a string item, skipping phonetic runs.
fn string_item_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.tag_name().name() == "t")
        .filter(|n| {
            !n.ancestors()
                .any(|a| a.tag_name().name() == "rPh")
        })
        .filter_map(|n| n.text())
        .collect()
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "si")
        .map(string_item_text)
        .collect())
}

#[derive(Debug, Default)]
struct Styles {
    fills: Vec<Fill>,
    /// fillId of every entry of cellXfs
    xf_fills: Vec<usize>,
}

impl Styles {
    fn parse(xml: &str) -> Result<Styles> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        let fills: Vec<Fill> = child(root, "fills")
            .map(|fills| {
                fills
                    .children()
                    .filter(|n| n.tag_name().name() == "fill")
                    .map(parse_fill)
                    .collect()
            })
            .unwrap_or_default();
        let xf_fills: Vec<usize> = child(root, "cellXfs")
            .map(|xfs| {
                xfs.children()
                    .filter(|n| n.tag_name().name() == "xf")
                    .map(|xf| {
                        xf.attribute("fillId")
                            .and_then(|id| id.parse().ok())
                            .unwrap_or(0)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Styles { fills, xf_fills })
    }

    fn fill_for_style(&self, style: usize) -> Fill {
        self.xf_fills
            .get(style)
            .and_then(|&fill_id| self.fills.get(fill_id))
            .cloned()
            .unwrap_or_default()
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.tag_name().name() == name)
}

fn parse_fill(fill: Node<'_, '_>) -> Fill {
    let Some(fg) = child(fill, "patternFill").and_then(|p| child(p, "fgColor")) else {
        return Fill::None;
    };
    let tint = fg.attribute("tint").filter(|t| t.parse::<f64>().map_or(false, |v| v != 0.0));
    if let Some(rgb) = fg.attribute("rgb") {
        Fill::Color(rgb.to_ascii_uppercase())
    } else if let Some(theme) = fg.attribute("theme") {
        match tint {
            Some(tint) => Fill::Color(format!("theme:{theme}:{tint}")),
            None => Fill::Color(format!("theme:{theme}")),
        }
    } else if let Some(indexed) = fg.attribute("indexed") {
        Fill::Color(format!("indexed:{indexed}"))
    } else {
        Fill::None
    }
}

fn parse_cell_value(c: Node<'_, '_>, shared_strings: &[String]) -> Result<CellValue> {
    let cell_type = c.attribute("t").unwrap_or("n");
    if cell_type == "inlineStr" {
        return Ok(child(c, "is")
            .map(|is| CellValue::Text(string_item_text(is)))
            .unwrap_or_default());
    }
    let Some(v) = child(c, "v").map(|v| v.text().unwrap_or_default()) else {
        return Ok(CellValue::Empty);
    };
    Ok(match cell_type {
        "s" => {
            let idx: usize = v
                .trim()
                .parse()
                .with_context(|| format!("bad shared string index '{v}'"))?;
            let Some(s) = shared_strings.get(idx) else {
                bail!("shared string index {idx} out of range");
            };
            CellValue::Text(s.clone())
        }
        "b" => CellValue::Bool(v.trim() == "1"),
        "str" | "e" | "d" => CellValue::Text(v.to_string()),
        _ => match v.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(v.to_string()),
        },
    })
}

fn parse_worksheet(
    name: &str,
    xml: &str,
    shared_strings: &[String],
    styles: &Styles,
) -> Result<Sheet> {
    let doc = Document::parse(xml)?;
    let mut sheet = Sheet::new(name);
    let Some(data) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "sheetData")
    else {
        return Ok(sheet);
    };

    let mut row_num = 0u32;
    for row in data.children().filter(|n| n.tag_name().name() == "row") {
        row_num = row
            .attribute("r")
            .and_then(|r| r.parse().ok())
            .unwrap_or(row_num + 1);
        let mut col_num = 0u32;
        for c in row.children().filter(|n| n.tag_name().name() == "c") {
            col_num = match c.attribute("r").and_then(parse_cell_ref) {
                Some((_, col)) => col,
                None => col_num + 1,
            };
            let fill = c
                .attribute("s")
                .and_then(|s| s.parse::<usize>().ok())
                .map(|s| styles.fill_for_style(s))
                .unwrap_or_default();
            let value = parse_cell_value(c, shared_strings)?;
            if value.is_empty() && fill == Fill::None {
                continue;
            }
            sheet.set_cell(row_num, col_num, Cell { value, fill });
        }
    }
    Ok(sheet)
}
