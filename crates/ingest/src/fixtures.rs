//! xlsx fixtures built in memory for tests.

use std::io::Cursor;

pub enum Cell {
    Text(&'static str),
    Number(f64),
    Blank,
}

/// Build a one-sheet workbook; `rows[0]` lands in row 1.
pub fn workbook(rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .expect("new workbook has Sheet1");

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let coordinate = (c as u32 + 1, r as u32 + 1);
            match cell {
                Cell::Text(text) => {
                    sheet.get_cell_mut(coordinate).set_value_string(*text);
                }
                Cell::Number(n) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*n);
                }
                Cell::Blank => {}
            }
        }
    }

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out).expect("workbook serializes");
    out.into_inner()
}

pub const HEADER: [&str; 10] = [
    "date",
    "sales",
    "newClients",
    "activeUsers",
    "performance",
    "campaignId",
    "impressions",
    "clicks",
    "conversions",
    "spend",
];

/// Header row plus one row per `(date, sales)` pair with fixed side metrics.
pub fn sales_sheet(rows: &[(&'static str, f64)]) -> Vec<u8> {
    let mut grid = vec![HEADER.iter().map(|h| Cell::Text(*h)).collect::<Vec<_>>()];
    for (date, sales) in rows {
        grid.push(vec![
            Cell::Text(*date),
            Cell::Number(*sales),
            Cell::Number(2.0),
            Cell::Number(40.0),
            Cell::Number(75.0),
            Cell::Blank,
            Cell::Number(1000.0),
            Cell::Number(50.0),
            Cell::Number(5.0),
            Cell::Number(20.0),
        ]);
    }
    workbook(&grid)
}
