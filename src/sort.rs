use std::cmp::Ordering;

use tracing::trace;

use crate::data::{DataPoint, Dataset};
use crate::domain::{SortColumn, SortDirection};

/// Comparator for the string-keyed columns. It assumes the caller flips the
/// result for descending sorts; the direction is consulted only for the
/// empty-value tie-break, so that empty values end up at the end of the
/// visible list in both directions.
pub fn compare_location(a: &str, b: &str, direction: SortDirection) -> Ordering {
    let descending = direction == SortDirection::Descending;
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if descending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if descending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => a.cmp(b),
    }
}

fn oriented(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

fn count_key(point: &DataPoint, column: SortColumn, day: usize) -> u64 {
    match column {
        SortColumn::Confirmed => point.confirmed_at(day),
        SortColumn::Deaths => point.deaths_at(day),
        SortColumn::Recovered => point.recovered_at(day),
        _ => None,
    }
    .unwrap_or(0)
}

/// Stable in-place sort of a row index vector. The count columns compare by
/// their value at the given day, everything else by its rendered cell text.
pub fn sort_rows(
    rows: &mut [usize],
    dataset: &Dataset,
    column: SortColumn,
    direction: SortDirection,
    day: usize,
) {
    trace!(
        "Sorting {} rows by {:?} {:?} (day {})",
        rows.len(),
        column,
        direction,
        day
    );
    let points = dataset.points();
    if column.is_time_dependent() {
        rows.sort_by(|&a, &b| {
            let va = count_key(&points[a], column, day);
            let vb = count_key(&points[b], column, day);
            oriented(va.cmp(&vb), direction)
        });
    } else {
        rows.sort_by(|&a, &b| {
            let va = points[a].cell_text(column, day);
            let vb = points[b].cell_text(column, day);
            oriented(compare_location(&va, &vb, direction), direction)
        });
    }
}
