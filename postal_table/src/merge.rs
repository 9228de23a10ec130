//! In-place merge-join of one series into a wide table.

use postal_codec::{Series, EPSILON};
use tracing::debug;

use crate::{Row, WideTable};

/// Append `series` to `table` as one new column.
///
/// Rows and points are both ascending, so a single forward cursor suffices.
/// Timestamps within [`EPSILON`] of an existing row land in that row; other
/// timestamps get a new row with nulls in every older column. Every row that
/// the series does not cover gets a null in the new column.
pub fn merge(table: &mut WideTable, series: &Series) {
    let existing = table.columns();
    let bootstrap = table.len() == 1 && existing == 0;
    let rows = table.rows_mut();
    let mut cursor = 0usize;

    for (index, point) in series.iter().enumerate() {
        let (t, v) = (point.timestamp, point.value);
        if index == 0 && bootstrap {
            rows[0].timestamp = t;
        }

        loop {
            if cursor >= rows.len() {
                let mut row = Row::blank(t, existing);
                row.values.push(Some(v));
                rows.push(row);
                break;
            }

            let row = &mut rows[cursor];
            let delta = t - row.timestamp;
            if delta > EPSILON {
                // Row predates this point: it gets no value from this series.
                if row.values.len() == existing {
                    row.values.push(None);
                }
                cursor += 1;
            } else if delta < -EPSILON {
                let mut row = Row::blank(t, existing);
                row.values.push(Some(v));
                rows.insert(cursor, row);
                break;
            } else {
                if row.values.len() == existing {
                    row.values.push(Some(v));
                } else {
                    debug!(t, row_t = row.timestamp, "point shares a row with its predecessor, dropped");
                }
                break;
            }
        }
    }

    for row in rows.iter_mut().skip(cursor) {
        if row.values.len() == existing {
            row.values.push(None);
        }
    }
    table.set_columns(existing + 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_codec::{Timestamp, Value};

    fn series(pairs: &[(f64, i32)]) -> Series {
        Series::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    fn dump(table: &WideTable) -> Vec<(Timestamp, Vec<Option<i64>>)> {
        table
            .rows()
            .iter()
            .map(|r| {
                let values = r
                    .values
                    .iter()
                    .map(|v| {
                        v.map(|v| match v {
                            Value::Signed(v) => v,
                            other => panic!("unexpected {other:?}"),
                        })
                    })
                    .collect();
                (r.timestamp, values)
            })
            .collect()
    }

    fn as_pairs(s: &Series) -> Vec<(Timestamp, Value)> {
        s.iter().map(|p| (p.timestamp, p.value)).collect()
    }

    #[test]
    fn merge_example_a_then_b() {
        let a = series(&[(0.0, 1), (2.0, 2), (4.0, 3)]);
        let b = series(&[(1.0, 10), (2.0, 20)]);
        let mut table = WideTable::new();
        merge(&mut table, &a);
        merge(&mut table, &b);

        assert_eq!(
            dump(&table),
            vec![
                (0.0, vec![Some(1), None]),
                (1.0, vec![None, Some(10)]),
                (2.0, vec![Some(2), Some(20)]),
                (4.0, vec![Some(3), None]),
            ]
        );
        assert!(table.is_consistent());
        assert_eq!(table.column(0).unwrap(), as_pairs(&a));
        assert_eq!(table.column(1).unwrap(), as_pairs(&b));
    }

    #[test]
    fn merge_example_b_then_a() {
        let a = series(&[(0.0, 1), (2.0, 2), (4.0, 3)]);
        let b = series(&[(1.0, 10), (2.0, 20)]);
        let mut table = WideTable::new();
        merge(&mut table, &b);
        merge(&mut table, &a);

        assert_eq!(
            dump(&table),
            vec![
                (0.0, vec![None, Some(1)]),
                (1.0, vec![Some(10), None]),
                (2.0, vec![Some(20), Some(2)]),
                (4.0, vec![None, Some(3)]),
            ]
        );
        assert!(table.is_consistent());
        assert_eq!(table.column(0).unwrap(), as_pairs(&b));
        assert_eq!(table.column(1).unwrap(), as_pairs(&a));
    }

    #[test]
    fn first_merge_moves_the_sentinel() {
        let mut table = WideTable::new();
        merge(&mut table, &series(&[(5.0, 1), (6.0, 2)]));
        assert_eq!(dump(&table), vec![(5.0, vec![Some(1)]), (6.0, vec![Some(2)])]);
    }

    #[test]
    fn timestamps_within_epsilon_share_a_row() {
        let mut table = WideTable::new();
        merge(&mut table, &series(&[(1.0, 1), (2.0, 2)]));
        merge(&mut table, &series(&[(1.0004, 10), (1.9995, 20), (2.5, 30)]));
        assert_eq!(
            dump(&table),
            vec![
                (1.0, vec![Some(1), Some(10)]),
                (2.0, vec![Some(2), Some(20)]),
                (2.5, vec![None, Some(30)]),
            ]
        );
    }

    #[test]
    fn second_point_in_a_claimed_row_is_dropped() {
        let mut table = WideTable::new();
        merge(&mut table, &series(&[(1.0, 1)]));
        merge(&mut table, &series(&[(0.9995, 10), (1.0004, 11), (3.0, 12)]));
        assert_eq!(
            dump(&table),
            vec![(1.0, vec![Some(1), Some(10)]), (3.0, vec![None, Some(12)])]
        );
        assert!(table.is_consistent());
    }

    #[test]
    fn empty_series_adds_a_null_column() {
        let mut table = WideTable::new();
        merge(&mut table, &series(&[(0.0, 1), (1.0, 2)]));
        merge(&mut table, &Series::empty());
        assert_eq!(
            dump(&table),
            vec![(0.0, vec![Some(1), None]), (1.0, vec![Some(2), None])]
        );

        let mut fresh = WideTable::new();
        merge(&mut fresh, &Series::empty());
        assert_eq!(dump(&fresh), vec![(0.0, vec![None])]);
        assert!(fresh.is_consistent());
    }

    #[test]
    fn interleaved_series_keep_every_column_intact() {
        let a = series(&[(0.0, 1), (3.0, 2), (6.0, 3), (9.0, 4)]);
        let b = series(&[(1.0, 10), (3.0, 20), (10.0, 30)]);
        let c = series(&[(-1.0, 100), (6.0005, 200)]);
        let mut table = WideTable::new();
        for s in [&a, &b, &c] {
            merge(&mut table, s);
            assert!(table.is_consistent());
        }
        assert_eq!(table.columns(), 3);
        assert_eq!(table.column(0).unwrap(), as_pairs(&a));
        assert_eq!(table.column(1).unwrap(), as_pairs(&b));
        // Column c's second point landed on the 6.0 row.
        assert_eq!(
            table.column(2).unwrap(),
            vec![(-1.0, Value::Signed(100)), (6.0, Value::Signed(200))]
        );
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn nan_timestamp_never_reaches_the_table() {
        let mut blob = b"u8\n".to_vec();
        blob.extend_from_slice(&f64::NAN.to_le_bytes());
        blob.push(1);
        assert!(postal_codec::decode_blob(&blob).is_err());
        assert!(Series::try_from_pairs([(f64::NAN, 1)]).is_err());

        // the table that would have been poisoned still aligns every point
        let mut table = WideTable::new();
        merge(&mut table, &series(&[(1.0, 10), (2.0, 20), (3.0, 30)]));
        assert_eq!(table.len(), 3);
        assert_eq!(table.column(0).unwrap().len(), 3);
        assert!(table.is_consistent());
    }
}
