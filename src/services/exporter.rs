// src/services/exporter.rs
// DOCUMENTATION: Spreadsheet export
// PURPOSE: Write collected place records to a single-sheet .xlsx file

use crate::errors::PlacesError;
use crate::models::PlaceRecord;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Name of the single worksheet
pub const SHEET_NAME: &str = "Places";

/// Column headers, in record field order
pub const HEADERS: [&str; 8] = [
    "Name",
    "Address",
    "Latitude",
    "Longitude",
    "Category Code",
    "Category Name",
    "Rating",
    "Place ID",
];

/// Destination for a finished record collection
pub trait Exporter {
    /// Write every record to `path`, replacing any existing file
    fn write(&self, records: &[PlaceRecord], path: &Path) -> Result<(), PlacesError>;
}

/// Excel exporter
/// DOCUMENTATION: Renders the workbook in memory, writes it to a temporary file
/// next to the destination and renames it into place, so a failed export never
/// leaves a partial file behind
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxExporter;

impl XlsxExporter {
    /// Build the workbook bytes
    fn render(&self, records: &[PlaceRecord]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x4F81BD))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin);
        let cell_format = Format::new()
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;

            let text_cells = [
                (0, Some(record.name().to_string())),
                (1, Some(record.address().to_string())),
                (4, record.category_code_display()),
                (5, Some(record.category_name().to_string())),
                (7, Some(record.place_id().to_string())),
            ];
            for (col, value) in text_cells {
                if let Some(value) = value {
                    widths[col] = widths[col].max(value.chars().count());
                    worksheet.write_string_with_format(row, col as u16, value, &cell_format)?;
                }
            }

            let number_cells = [
                (2, Some(record.latitude())),
                (3, Some(record.longitude())),
                (6, record.rating()),
            ];
            for (col, value) in number_cells {
                if let Some(value) = value {
                    widths[col] = widths[col].max(value.to_string().len());
                    worksheet.write_number_with_format(row, col as u16, value, &cell_format)?;
                }
            }
        }

        for (col, width) in widths.iter().enumerate() {
            // Cap very long addresses so the sheet stays readable
            let width = (*width + 2).min(60);
            worksheet.set_column_width(col as u16, width as f64)?;
        }

        worksheet.set_freeze_panes(1, 0)?;

        workbook.save_to_buffer()
    }
}

impl Exporter for XlsxExporter {
    fn write(&self, records: &[PlaceRecord], path: &Path) -> Result<(), PlacesError> {
        let bytes = self
            .render(records)
            .map_err(|e| PlacesError::io(path, format!("spreadsheet encoding failed: {}", e)))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(|e| PlacesError::io(path, e))?;
        file.write_all(&bytes).map_err(|e| PlacesError::io(path, e))?;
        file.as_file().sync_all().map_err(|e| PlacesError::io(path, e))?;
        file.persist(path).map_err(|e| PlacesError::io(path, e.error))?;

        log::info!(
            "Saved {} places to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryTable;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use std::path::PathBuf;

    fn read_rows(path: &Path) -> Vec<Vec<Data>> {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        range.rows().map(|row| row.to_vec()).collect()
    }

    fn header_row() -> Vec<Data> {
        HEADERS.iter().map(|h| Data::String(h.to_string())).collect()
    }

    fn sample_records() -> Vec<PlaceRecord> {
        let table = CategoryTable::standard();
        vec![
            PlaceRecord::new(
                "ChIJ1",
                "Test Restaurant",
                "123 Test St",
                40.7128,
                -74.006,
                Some(5812),
                Some(4.5),
                &table,
            ),
            PlaceRecord::new("ChIJ2", "Vet", "", 40.0, -3.5, Some(742), None, &table),
            PlaceRecord::new("ChIJ3", "Unknown", "Nowhere", 1.0, 2.0, None, None, &table),
        ]
    }

    #[test]
    fn test_empty_collection_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        XlsxExporter::default().write(&[], &path).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows, vec![header_row()]);
    }

    #[test]
    fn test_rows_follow_record_order_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.xlsx");

        XlsxExporter::default().write(&sample_records(), &path).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], header_row());

        assert_eq!(rows[1][0], Data::String("Test Restaurant".to_string()));
        assert_eq!(rows[1][1], Data::String("123 Test St".to_string()));
        assert_eq!(rows[1][2], Data::Float(40.7128));
        assert_eq!(rows[1][3], Data::Float(-74.006));
        assert_eq!(rows[1][4], Data::String("5812".to_string()));
        assert_eq!(rows[1][5], Data::String("Eating Places and Restaurants".to_string()));
        assert_eq!(rows[1][6], Data::Float(4.5));
        assert_eq!(rows[1][7], Data::String("ChIJ1".to_string()));

        assert_eq!(rows[2][4], Data::String("0742".to_string()));
        assert_eq!(rows[2][6], Data::Empty);
        assert_eq!(rows[2][7], Data::String("ChIJ2".to_string()));

        assert_eq!(rows[3][4], Data::Empty);
        assert_eq!(rows[3][5], Data::String("Uncategorized".to_string()));
    }

    #[test]
    fn test_existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.xlsx");
        std::fs::write(&path, b"stale contents").unwrap();

        XlsxExporter::default().write(&sample_records()[..1], &path).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][7], Data::String("ChIJ1".to_string()));
    }

    #[test]
    fn test_unwritable_destination_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("missing").join("places.xlsx");

        let err = XlsxExporter::default().write(&[], &path).unwrap_err();

        match err {
            PlacesError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected Io error, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_single_places_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("named.xlsx");

        XlsxExporter.write(&sample_records(), &path).unwrap();

        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
    }
}
