//! Parsing of AutoDock Vina result tables.
//!
//! Vina prints a table after docking:
//!
//! ```text
//! mode |   affinity | dist from best mode
//!      | (kcal/mol) | rmsd l.b.| rmsd u.b.
//! -----+------------+----------+----------
//!    1         -8.3      0.000      0.000
//!    2         -7.9      1.874      2.410
//! ```
//!
//! Modes are ordered best first, so the first data row carries the best
//! affinity.

use serde::{Deserialize, Serialize};

/// Header line that opens the result table.
pub const TABLE_HEADER: &str = "mode |   affinity | dist from best mode";

/// Affinities at or beyond this magnitude are treated as parse noise.
pub const MAX_PLAUSIBLE_AFFINITY: f64 = 15.0;

/// One row of the Vina result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingMode {
    pub mode: u32,
    /// kcal/mol, more negative is stronger
    pub affinity: f64,
    pub rmsd_lower: f64,
    pub rmsd_upper: f64,
}

fn is_table_chrome(line: &str) -> bool {
    line.contains("-----+") || line.contains("(kcal/mol)") || line.contains("mode |")
}

fn table_rows(log: &str) -> impl Iterator<Item = &str> {
    log.lines()
        .skip_while(|line| !line.contains(TABLE_HEADER))
        .skip(1)
        .filter(|line| !line.trim().is_empty() && !is_table_chrome(line))
}

/// Best binding affinity from a Vina log.
///
/// Returns `None` when the header is absent or no row after it carries a
/// negative affinity below [`MAX_PLAUSIBLE_AFFINITY`] in magnitude.
pub fn parse_best_affinity(log: &str) -> Option<f64> {
    table_rows(log).find_map(|line| {
        let value = line.split_whitespace().nth(1)?.parse::<f64>().ok()?;
        (value < 0.0 && value.abs() < MAX_PLAUSIBLE_AFFINITY).then_some(value)
    })
}

/// Every well-formed row of the result table, in the order Vina printed them.
pub fn parse_modes(log: &str) -> Vec<BindingMode> {
    table_rows(log)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let mode = parts.next()?.parse::<u32>().ok()?;
            let affinity = parts.next()?.parse::<f64>().ok()?;
            let rmsd_lower = parts.next()?.parse::<f64>().ok()?;
            let rmsd_upper = parts.next()?.parse::<f64>().ok()?;
            Some(BindingMode {
                mode,
                affinity,
                rmsd_lower,
                rmsd_upper,
            })
        })
        .collect()
}
