//! Grid table layout.
//!
//! Cells are found by walking the `+`, `-` and `|` borders clockwise from each
//! cell's top-left corner, so row and column spans fall out of the walk. A
//! `+===+` line splits header rows from body rows.

use std::collections::BTreeSet;

/// One cell of the grid with its raw text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CellLayout {
    pub(crate) morerows: usize,
    pub(crate) morecols: usize,
    /// Offset of the first text line from the top border of the table.
    pub(crate) first_line: usize,
    pub(crate) lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GridLayout {
    pub(crate) colwidths: Vec<usize>,
    pub(crate) head_rows: usize,
    /// Cells keyed by the row they start in, left to right.
    pub(crate) rows: Vec<Vec<CellLayout>>,
}

/// Whether `text` can open a grid table: `+---+---+`.
pub(crate) fn is_grid_border(text: &str) -> bool {
    text.len() >= 3 && text.starts_with("+-") && text.ends_with('+') && text.chars().all(|c| c == '+' || c == '-')
}

fn is_head_separator(text: &str) -> bool {
    text.len() >= 3 && text.starts_with("+=") && text.ends_with('+') && text.chars().all(|c| c == '+' || c == '=')
}

struct Grid {
    chars: Vec<Vec<char>>,
    bottom: usize,
    right: usize,
}

struct Scan {
    bottom: usize,
    right: usize,
    rowseps: Vec<usize>,
    colseps: Vec<usize>,
}

impl Grid {
    fn at(&self, row: usize, col: usize) -> char {
        self.chars[row][col]
    }

    fn scan_right(&self, top: usize, left: usize) -> Option<Scan> {
        for col in left + 1..=self.right {
            match self.at(top, col) {
                '+' => {
                    if let Some(mut scan) = self.scan_down(top, left, col) {
                        scan.colseps.push(col);
                        return Some(scan);
                    }
                }
                '-' => {}
                _ => return None,
            }
        }
        None
    }

    fn scan_down(&self, top: usize, left: usize, right: usize) -> Option<Scan> {
        let mut rowseps = Vec::new();
        for row in top + 1..=self.bottom {
            match self.at(row, right) {
                '+' => {
                    rowseps.push(row);
                    if let Some((more_rowseps, colseps)) = self.scan_left(top, left, row, right) {
                        rowseps.extend(more_rowseps);
                        return Some(Scan {
                            bottom: row,
                            right,
                            rowseps,
                            colseps,
                        });
                    }
                }
                '|' => {}
                _ => return None,
            }
        }
        None
    }

    fn scan_left(&self, top: usize, left: usize, bottom: usize, right: usize) -> Option<(Vec<usize>, Vec<usize>)> {
        let mut colseps = Vec::new();
        for col in (left + 1..right).rev() {
            match self.at(bottom, col) {
                '+' => colseps.push(col),
                '-' => {}
                _ => return None,
            }
        }
        if self.at(bottom, left) != '+' {
            return None;
        }
        let rowseps = self.scan_up(top, left, bottom)?;
        Some((rowseps, colseps))
    }

    fn scan_up(&self, top: usize, left: usize, bottom: usize) -> Option<Vec<usize>> {
        let mut rowseps = Vec::new();
        for row in (top + 1..bottom).rev() {
            match self.at(row, left) {
                '+' => rowseps.push(row),
                '|' => {}
                _ => return None,
            }
        }
        Some(rowseps)
    }

    fn cell_lines(&self, top: usize, left: usize, bottom: usize, right: usize) -> Vec<String> {
        (top + 1..bottom)
            .map(|row| {
                self.chars[row][left + 1..right]
                    .iter()
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }
}

/// Lay out the lines of a grid table. The error is a detail line for the
/// "Malformed table." message.
pub(crate) fn parse_grid(lines: &[&str]) -> Result<GridLayout, String> {
    let Some(first) = lines.first() else {
        return Err("Empty table.".to_string());
    };
    let width = first.chars().count();
    for line in lines {
        if line.chars().count() != width {
            return Err("Text in column margin or right border not aligned.".to_string());
        }
        let starts = line.starts_with(['+', '|']);
        let ends = line.ends_with(['+', '|']);
        if !starts || !ends {
            return Err("Left or right border missing.".to_string());
        }
    }
    let bottom = lines.len() - 1;
    if bottom == 0 || !is_grid_border(lines[bottom]) {
        return Err("Bottom border missing.".to_string());
    }

    let separators: Vec<usize> = (1..bottom).filter(|&row| is_head_separator(lines[row])).collect();
    let head_separator = match separators.as_slice() {
        [] => None,
        [row] => Some(*row),
        _ => return Err("Multiple head/body row separators.".to_string()),
    };

    let chars = lines
        .iter()
        .enumerate()
        .map(|(row, line)| {
            if Some(row) == head_separator {
                line.chars().map(|c| if c == '=' { '-' } else { c }).collect()
            } else {
                line.chars().collect()
            }
        })
        .collect();
    let grid = Grid {
        chars,
        bottom,
        right: width - 1,
    };

    let mut rowseps = BTreeSet::from([0]);
    let mut colseps = BTreeSet::from([0]);
    let mut done = vec![0usize; grid.right];
    let mut corners = BTreeSet::from([(0usize, 0usize)]);
    let mut cells = Vec::new();

    while let Some((top, left)) = corners.pop_first() {
        if top == grid.bottom || left == grid.right || top < done[left] {
            continue;
        }
        let Some(scan) = grid.scan_right(top, left) else {
            continue;
        };
        rowseps.extend(scan.rowseps.iter().copied());
        colseps.extend(scan.colseps.iter().copied());
        for column in &mut done[left..scan.right] {
            if *column != top {
                return Err("Overlapping cells.".to_string());
            }
            *column = scan.bottom;
        }
        cells.push((top, left, scan.bottom, scan.right));
        corners.insert((top, scan.right));
        corners.insert((scan.bottom, left));
    }
    if done.iter().any(|&row| row != grid.bottom) {
        return Err("Parse incomplete.".to_string());
    }

    let rowseps: Vec<usize> = rowseps.into_iter().collect();
    let colseps: Vec<usize> = colseps.into_iter().collect();
    let row_index = |row: usize| rowseps.binary_search(&row).unwrap_or_default();
    let col_index = |col: usize| colseps.binary_search(&col).unwrap_or_default();

    let head_rows = match head_separator {
        Some(row) => rowseps
            .binary_search(&row)
            .map_err(|_| "Head/body row separator is not a row boundary.".to_string())?,
        None => 0,
    };

    cells.sort_unstable();
    let mut rows: Vec<Vec<CellLayout>> = vec![Vec::new(); rowseps.len() - 1];
    for (top, left, bottom, right) in cells {
        let row = row_index(top);
        rows[row].push(CellLayout {
            morerows: row_index(bottom) - row - 1,
            morecols: col_index(right) - col_index(left) - 1,
            first_line: top + 1,
            lines: grid.cell_lines(top, left, bottom, right),
        });
    }

    Ok(GridLayout {
        colwidths: colseps.windows(2).map(|pair| pair[1] - pair[0] - 1).collect(),
        head_rows,
        rows,
    })
}
