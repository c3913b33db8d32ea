//! Sample workbook users fill in before importing

use super::table::{Table, TableCell};
use crate::store::atomic_write;
use anyhow::Result;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const TEMPLATE_FILE_NAME: &str = "modelo_importacao_viabiliza.xlsx";
pub const TEMPLATE_SHEET_NAME: &str = "Importação";

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Header row plus two example items
pub fn template_table() -> Table {
    let item = |name: &str, quantity: f64, price: f64, category: &str| {
        vec![
            TableCell::Text(name.to_string()),
            TableCell::Number(quantity),
            TableCell::Number(price),
            TableCell::Text(category.to_string()),
        ]
    };
    Table::new(
        ["Descrição", "Quantidade", "Preço Unitário", "Categoria"]
            .map(String::from)
            .to_vec(),
        vec![
            item("Exemplo Item A", 10.0, 5000.0, "Mobiliário"),
            item("Exemplo Item B", 5.0, 15000.0, "Informática"),
        ],
    )
}

/// Encode `table` as a single-sheet XLSX workbook
pub fn template_bytes(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let sheet_xml = worksheet_xml(table, &mut strings)?;
    let strings_xml = strings.to_xml()?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS.as_bytes())?;
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(sheet_name).as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(WORKBOOK_RELS.as_bytes())?;
    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(&sheet_xml)?;
    zip.start_file("xl/sharedStrings.xml", options)?;
    zip.write_all(&strings_xml)?;

    Ok(zip.finish()?.into_inner())
}

/// Write the sample import workbook to `path`
pub fn save_import_template(path: &Path) -> Result<()> {
    let bytes = template_bytes(&template_table(), TEMPLATE_SHEET_NAME)?;
    atomic_write(path, &bytes)?;
    log::info!("Wrote import template to {}", path.display());
    Ok(())
}

/// Shared string table, in first-use order
#[derive(Default)]
struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    fn index(&mut self, text: &str) -> usize {
        match self.strings.iter().position(|s| s == text) {
            Some(idx) => idx,
            None => {
                self.strings.push(text.to_string());
                self.strings.len() - 1
            }
        }
    }

    fn to_xml(&self) -> Result<Vec<u8>> {
        let count = self.strings.len().to_string();
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer.write_event(Event::Start(BytesStart::new("sst").with_attributes([
            ("xmlns", MAIN_NS),
            ("count", count.as_str()),
            ("uniqueCount", count.as_str()),
        ])))?;
        for text in &self.strings {
            writer.write_event(Event::Start(BytesStart::new("si")))?;
            write_text_element(&mut writer, "t", text)?;
            writer.write_event(Event::End(BytesEnd::new("si")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("sst")))?;
        Ok(writer.into_inner().into_inner())
    }
}

fn worksheet_xml(table: &Table, strings: &mut SharedStrings) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", MAIN_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<TableCell> = table
        .headers
        .iter()
        .map(|h| TableCell::Text(h.clone()))
        .collect();
    for (r, cells) in std::iter::once(&header).chain(&table.rows).enumerate() {
        let row_number = (r + 1).to_string();
        writer.write_event(Event::Start(
            BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
        ))?;

        for (c, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), row_number);
            let (kind, value) = match cell {
                TableCell::Empty => continue,
                TableCell::Text(text) => (Some("s"), strings.index(text).to_string()),
                TableCell::Number(n) => (None, n.to_string()),
                TableCell::Boolean(b) => (Some("b"), u8::from(*b).to_string()),
            };

            let mut start = BytesStart::new("c");
            start.push_attribute(("r", reference.as_str()));
            if let Some(kind) = kind {
                start.push_attribute(("t", kind));
            }
            writer.write_event(Event::Start(start))?;
            write_text_element(&mut writer, "v", &value)?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner().into_inner())
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        MAIN_NS,
        escape(sheet_name)
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;
