//! Tabular rendering of provider flavors.

use crate::provider::Flavor;

const HEADER: [&str; 4] = ["Name", "RAM", "Disk", "Swap"];
const COLUMN_GAP: &str = "  ";
const MIB_PER_GIB: u64 = 1024;

fn gigabytes(mebibytes: u64) -> String {
    format!("{} GB", mebibytes.div_euclid(MIB_PER_GIB))
}

fn row(flavor: &Flavor) -> [String; 4] {
    [
        flavor.name.clone(),
        gigabytes(flavor.memory),
        gigabytes(flavor.disk),
        gigabytes(flavor.swap),
    ]
}

/// Renders flavors as a left-aligned table sorted by memory.
///
/// Sizes are whole gibibytes, truncated. Flavors with equal memory keep
/// their provider order.
#[must_use]
pub fn render_flavor_table(flavors: &[Flavor]) -> String {
    let mut sorted: Vec<&Flavor> = flavors.iter().collect();
    sorted.sort_by_key(|flavor| flavor.memory);

    let mut rows = vec![HEADER.map(str::to_owned)];
    rows.extend(sorted.into_iter().map(row));

    let mut widths = [0_usize; 4];
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = String::new();
    for cells in &rows {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP);
        table.push_str(line.trim_end());
        table.push('\n');
    }
    table
}
