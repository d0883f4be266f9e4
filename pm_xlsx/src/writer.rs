//! Write `Sheet` grids (values and fills) as a minimal `.xlsx` workbook.
//!
//! The output is deterministic: parts are written in a fixed order with a
//! fixed timestamp, so identical inputs give identical bytes.

use crate::sheet::{cell_ref, CellValue, Fill, Sheet};
use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use pm_types::Table;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Lay a table out as a sheet: header in row 1, data from row 2.
pub fn table_to_sheet(title: &str, table: &Table) -> Sheet {
    let mut sheet = Sheet::new(title);
    for (c, name) in table.columns().iter().enumerate() {
        sheet.set_value(1, c as u32 + 1, name.as_str());
    }
    for (r, row) in table.rows().iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            let value = CellValue::from(v);
            if !value.is_empty() {
                sheet.set_value(r as u32 + 2, c as u32 + 1, value);
            }
        }
    }
    sheet
}

/// Write `table` as a single-sheet workbook at `path`.
pub fn write_table(path: &Path, table: &Table, sheet_title: &str) -> Result<()> {
    write_sheets_to_path(path, &[table_to_sheet(sheet_title, table)])
}

pub fn write_sheets_to_path(path: &Path, sheets: &[Sheet]) -> Result<()> {
    let file = File::create(path).with_context(|| path.display().to_string())?;
    let mut w = write_workbook(BufWriter::new(file), sheets)
        .with_context(|| format!("writing {}", path.display()))?;
    w.flush()?;
    Ok(())
}

/// Write the workbook into `w` and hand the writer back.
pub fn write_workbook<W: Write + Seek>(w: W, sheets: &[Sheet]) -> Result<W> {
    ensure!(!sheets.is_empty(), "a workbook needs at least one sheet");
    let colors: Vec<&str> = sheets
        .iter()
        .flat_map(|s| s.cells())
        .filter_map(|(_, c)| match &c.fill {
            Fill::Color(token) => Some(token.as_str()),
            Fill::None => None,
        })
        .unique()
        .collect();

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut zip = ZipWriter::new(w);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types(sheets.len()).as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(root_rels().as_bytes())?;
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(sheets).as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(workbook_rels(sheets.len()).as_bytes())?;
    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(styles_xml(&colors).as_bytes())?;
    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(worksheet_xml(sheet, &colors).as_bytes())?;
    }
    Ok(zip.finish()?)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn content_types(n_sheets: usize) -> String {
    let mut s = format!(
        "{XML_DECL}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
         <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>"
    );
    for i in 1..=n_sheets {
        let _ = write!(
            s,
            "<Override PartName=\"/xl/worksheets/sheet{i}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
        );
    }
    s.push_str("</Types>");
    s
}

fn root_rels() -> String {
    format!(
        "{XML_DECL}<Relationships xmlns=\"{NS_PKG_REL}\">\
         <Relationship Id=\"rId1\" Type=\"{NS_REL}/officeDocument\" Target=\"xl/workbook.xml\"/>\
         </Relationships>"
    )
}

fn workbook_xml(sheets: &[Sheet]) -> String {
    let mut s = format!("{XML_DECL}<workbook xmlns=\"{NS_MAIN}\" xmlns:r=\"{NS_REL}\"><sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        let _ = write!(
            s,
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
            escape(sheet.title()),
            i + 1,
            i + 1
        );
    }
    s.push_str("</sheets></workbook>");
    s
}

fn workbook_rels(n_sheets: usize) -> String {
    let mut s = format!("{XML_DECL}<Relationships xmlns=\"{NS_PKG_REL}\">");
    for i in 1..=n_sheets {
        let _ = write!(
            s,
            "<Relationship Id=\"rId{i}\" Type=\"{NS_REL}/worksheet\" Target=\"worksheets/sheet{i}.xml\"/>"
        );
    }
    let _ = write!(
        s,
        "<Relationship Id=\"rId{}\" Type=\"{NS_REL}/styles\" Target=\"styles.xml\"/></Relationships>",
        n_sheets + 1
    );
    s
}

fn fg_color(token: &str) -> String {
    if let Some(theme) = token.strip_prefix("theme:") {
        match theme.split_once(':') {
            Some((theme, tint)) => format!("<fgColor theme=\"{theme}\" tint=\"{tint}\"/>"),
            None => format!("<fgColor theme=\"{theme}\"/>"),
        }
    } else if let Some(indexed) = token.strip_prefix("indexed:") {
        format!("<fgColor indexed=\"{indexed}\"/>")
    } else {
        format!("<fgColor rgb=\"{}\"/>", escape(token))
    }
}

fn styles_xml(colors: &[&str]) -> String {
    let mut s = format!(
        "{XML_DECL}<styleSheet xmlns=\"{NS_MAIN}\">\
         <fonts count=\"1\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\
         <fills count=\"{}\"><fill><patternFill patternType=\"none\"/></fill>\
         <fill><patternFill patternType=\"gray125\"/></fill>",
        colors.len() + 2
    );
    for color in colors {
        let _ = write!(
            s,
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            fg_color(color)
        );
    }
    let _ = write!(
        s,
        "</fills><borders count=\"1\"><border/></borders>\
         <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
         <cellXfs count=\"{}\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>",
        colors.len() + 1
    );
    for i in 0..colors.len() {
        let _ = write!(
            s,
            "<xf numFmtId=\"0\" fontId=\"0\" fillId=\"{}\" borderId=\"0\" xfId=\"0\" applyFill=\"1\"/>",
            i + 2
        );
    }
    s.push_str("</cellXfs></styleSheet>");
    s
}

fn worksheet_xml(sheet: &Sheet, colors: &[&str]) -> String {
    let mut s = format!("{XML_DECL}<worksheet xmlns=\"{NS_MAIN}\"><sheetData>");
    for (row, cells) in &sheet.cells().group_by(|((r, _), _)| *r) {
        let _ = write!(s, "<row r=\"{row}\">");
        for ((r, c), cell) in cells {
            let style = match &cell.fill {
                Fill::Color(token) => colors
                    .iter()
                    .position(|x| *x == token.as_str())
                    .map_or(String::new(), |i| format!(" s=\"{}\"", i + 1)),
                Fill::None => String::new(),
            };
            let at = cell_ref(r, c);
            match &cell.value {
                CellValue::Empty => {
                    let _ = write!(s, "<c r=\"{at}\"{style}/>");
                }
                CellValue::Text(t) => {
                    let space = if t.trim() != t { " xml:space=\"preserve\"" } else { "" };
                    let _ = write!(
                        s,
                        "<c r=\"{at}\"{style} t=\"inlineStr\"><is><t{space}>{}</t></is></c>",
                        escape(t)
                    );
                }
                CellValue::Number(n) => {
                    let _ = write!(s, "<c r=\"{at}\"{style}><v>{n}</v></c>");
                }
                CellValue::Bool(b) => {
                    let _ = write!(s, "<c r=\"{at}\"{style} t=\"b\"><v>{}</v></c>", u8::from(*b));
                }
            }
        }
        s.push_str("</row>");
    }
    s.push_str("</sheetData></worksheet>");
    s
}
