//! Display geometry and the mapping of (column, row) to DDRAM addresses.

/// DDRAM base address of each row. The controller is wired as two lines of 40 characters;
/// four row displays split each line in two, so rows 2 and 3 continue rows 0 and 1.
pub const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Length of one controller line in characters.
pub const MAX_COLUMNS: u8 = 40;

/// Visible size of the display. Never smaller than 1x1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    column_max: u8,
    row_max: u8,
}

impl Default for Geometry {
    /// 16x2, the most common module.
    fn default() -> Self {
        Self::new(16, 2)
    }
}

impl Geometry {
    /// Counts are clamped to `1..=40` columns and `1..=4` rows.
    pub fn new(columns: u8, rows: u8) -> Self {
        let columns = columns.max(1).min(MAX_COLUMNS);
        let rows = rows.max(1).min(ROW_OFFSETS.len() as u8);
        Self {
            column_max: columns - 1,
            row_max: rows - 1,
        }
    }

    pub fn columns(&self) -> u8 {
        self.column_max + 1
    }

    pub fn rows(&self) -> u8 {
        self.row_max + 1
    }

    /// Last valid, zero based, column index.
    pub fn column_max(&self) -> u8 {
        self.column_max
    }

    /// Last valid, zero based, row index.
    pub fn row_max(&self) -> u8 {
        self.row_max
    }

    /// Clamps `col` and `row` into the display.
    pub fn clamp(&self, col: u8, row: u8) -> (u8, u8) {
        (col.min(self.column_max), row.min(self.row_max))
    }

    /// DDRAM address of the clamped position. Always below 0x80.
    pub fn ddram_address(&self, col: u8, row: u8) -> u8 {
        let (col, row) = self.clamp(col, row);
        ROW_OFFSETS[row as usize] + col
    }
}
