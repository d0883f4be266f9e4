//! pm_xlsx
//!
//! Just enough of the OOXML spreadsheet format for plate layouts: cell
//! values and fill colors in, values and fill colors out.

mod reader;
mod sheet;
mod writer;

pub use reader::Workbook;
pub use sheet::{cell_ref, parse_cell_ref, Cell, CellValue, Fill, Sheet};
pub use writer::{table_to_sheet, write_sheets_to_path, write_table, write_workbook};

#[cfg(test)]
mod tests {
    use super::*;
    use pm_types::{Table, Value};
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    fn write_to_vec(sheets: &[Sheet]) -> Vec<u8> {
        write_workbook(Cursor::new(Vec::new()), sheets)
            .unwrap()
            .into_inner()
    }

    fn layout_sheet() -> Sheet {
        let mut sheet = Sheet::new("LCE1 layout");
        sheet
            .set_value(1, 1, "sort description")
            .set_fill(2, 1, Fill::color("FFFF0000"))
            .set_value(2, 2, "sample <1> & co")
            .set_fill(3, 1, Fill::color("theme:4:0.39997558519241921"))
            .set_value(3, 2, 2.5)
            .set_value(4, 2, CellValue::Bool(true));
        sheet
    }

    #[test]
    fn test_roundtrip_values_and_fills() {
        let sheet = layout_sheet();
        let bytes = write_to_vec(&[sheet.clone(), Sheet::new("notes")]);
        let wb = Workbook::from_reader(Cursor::new(bytes), "layout.xlsx").unwrap();
        assert_eq!(wb.sheets().len(), 2);
        assert_eq!(wb.first_sheet(), Some(&sheet));
        assert_eq!(wb.sheet_with_prefix("lce").map(Sheet::title), Some("LCE1 layout"));
        assert_eq!(wb.sheet_with_prefix("NOTES").map(Sheet::title), Some("notes"));
        assert!(wb.sheet_with_prefix("prm").is_none());
    }

    #[test]
    fn test_deterministic_output() {
        let a = write_to_vec(&[layout_sheet()]);
        let b = write_to_vec(&[layout_sheet()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.xlsx");
        let table = Table::from_rows(
            ["Plate#", "Well position", "FSC-A"],
            vec![
                vec![Value::from("PRM2"), Value::from("A1"), Value::Number(10.0)],
                vec![Value::from("PRM2"), Value::from("A2"), Value::Null],
            ],
        )
        .unwrap();
        write_table(&path, &table, "Sheet1").unwrap();
        let wb = Workbook::open(&path).unwrap();
        let sheet = wb.first_sheet().unwrap();
        assert_eq!(sheet.title(), "Sheet1");
        assert_eq!(sheet.value(1, 3), &CellValue::from("FSC-A"));
        assert_eq!(sheet.value(2, 3), &CellValue::Number(10.0));
        assert!(sheet.value(3, 3).is_empty());
        assert_eq!(sheet.max_row(), 3);
    }

    /// A workbook in the shape spreadsheet programs write: shared strings,
    /// relationship targets with absolute paths and an indexed fill.
    #[test]
    fn test_read_shared_strings_and_styles() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = FileOptions::default();
        let parts = [
            (
                "xl/workbook.xml",
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="PRM2" sheetId="1" rel:id="rId7"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId7" Target="/xl/worksheets/data.xml"/></Relationships>"#,
            ),
            (
                "xl/sharedStrings.xml",
                r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>A</t></si><si><r><t>mou</t></r><r><t>se</t></r><rPh><t>x</t></rPh></si></sst>"#,
            ),
            (
                "xl/styles.xml",
                r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fills><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor indexed="13"/></patternFill></fill><fill><patternFill patternType="solid"><fgColor rgb="ff00ff00"/></patternFill></fill></fills><cellXfs><xf fillId="0"/><xf fillId="2"/><xf fillId="3"/></cellXfs></styleSheet>"#,
            ),
            (
                "xl/worksheets/data.xml",
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="2"><c r="B2" t="s"><v>0</v></c><c s="1"/><c r="E2" t="s" s="2"><v>1</v></c></row><row><c r="A3"><v>1</v></c><c r="B3" s="0"/></row></sheetData></worksheet>"#,
            ),
        ];
        for (name, xml) in parts {
            zip.start_file(name, opts).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();

        let wb = Workbook::from_reader(Cursor::new(bytes), "mem").unwrap();
        let sheet = wb.first_sheet().unwrap();
        assert_eq!(sheet.title(), "PRM2");
        assert_eq!(sheet.value(2, 2), &CellValue::from("A"));
        // cell without a reference follows its left neighbour
        assert_eq!(sheet.fill(2, 3), &Fill::color("indexed:13"));
        assert!(sheet.value(2, 3).is_empty());
        assert_eq!(sheet.value(2, 5), &CellValue::from("mouse"));
        assert_eq!(sheet.fill(2, 5), &Fill::color("FF00FF00"));
        // row without a number follows the previous row
        assert_eq!(sheet.value(3, 1), &CellValue::Number(1.0));
        assert!(sheet.cell(3, 2).is_none());
    }

    #[test]
    fn test_not_a_workbook() {
        let err = Workbook::from_reader(Cursor::new(b"Plate#,Well\n".to_vec()), "sheet.xlsx")
            .unwrap_err();
        assert_eq!(err.to_string(), "sheet.xlsx is not an xlsx workbook");
    }
}
