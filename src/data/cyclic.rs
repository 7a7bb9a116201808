// ============================================================
// Layer 4: Cyclic Encoder
// ============================================================
// Maps a periodic integer feature onto the unit circle:
//
//   angle = 2π · ((value − offset) mod period) / period
//   <col>_sin = sin(angle)
//   <col>_cos = cos(angle)
//
// Hour 23 and hour 0 end up next to each other instead of at
// opposite ends of a 0..23 scale. Typical periods for the bike
// sharing tables: hr → 24, weekday → 7, mnth → 12 (offset 1,
// since months run 1..=12).
//
// The modulus is Euclidean, so negative differences wrap
// correctly and `value` and `value + period` encode identically.
//
// Reference: Rust Book §3 (Data Types), f64::rem_euclid

use anyhow::{bail, Result};
use indexmap::IndexMap;
use std::f64::consts::PI;

use crate::domain::table::Table;

/// Angle in radians for one value.
pub fn cyclic_angle(value: f64, period: f64, offset: f64) -> f64 {
    2.0 * PI * (value - offset).rem_euclid(period) / period
}

/// (sin, cos) of `cyclic_angle`.
pub fn cyclic_pair(value: f64, period: f64, offset: f64) -> (f64, f64) {
    let angle = cyclic_angle(value, period, offset);
    (angle.sin(), angle.cos())
}

/// Append `<col>_sin` / `<col>_cos` for every column in `periods`.
///
/// Columns missing from `offsets` use offset 0. With `drop` the
/// source columns are removed afterwards.
pub fn cyclic_encode(
    table:   &Table,
    periods: &IndexMap<String, u32>,
    offsets: &IndexMap<String, i64>,
    drop:    bool,
) -> Result<Table> {
    let mut out = table.clone();

    for (col, &period) in periods {
        if period == 0 {
            bail!("period for column '{}' must be positive", col);
        }
        let period = f64::from(period);
        let offset = offsets.get(col).copied().unwrap_or(0) as f64;

        let values = table.numeric_column(col)?;

        let (sin, cos): (Vec<String>, Vec<String>) = values
            .iter()
            .map(|&v| {
                let (s, c) = cyclic_pair(v, period, offset);
                (s.to_string(), c.to_string())
            })
            .unzip();

        out.push_column(format!("{col}_sin"), sin)?;
        out.push_column(format!("{col}_cos"), cos)?;
    }

    if drop {
        let names: Vec<String> = periods.keys().cloned().collect();
        out = out.drop_columns(&names)?;
    }

    Ok(out)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_unit_circle() {
        for period in [7.0, 12.0, 24.0] {
            for v in -30..60 {
                let (s, c) = cyclic_pair(v as f64, period, 0.0);
                assert!((s * s + c * c - 1.0).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_periodic() {
        for v in 0..24 {
            let (s1, c1) = cyclic_pair(v as f64, 24.0, 0.0);
            let (s2, c2) = cyclic_pair(v as f64 + 24.0, 24.0, 0.0);
            assert!((s1 - s2).abs() < EPS && (c1 - c2).abs() < EPS);
        }
    }

    #[test]
    fn test_offset_applies_before_modulus() {
        // January (1) with offset 1 sits at angle 0, December just before it.
        assert!(cyclic_angle(1.0, 12.0, 1.0).abs() < EPS);
        let dec = cyclic_angle(12.0, 12.0, 1.0);
        assert!((dec - 2.0 * PI * 11.0 / 12.0).abs() < EPS);

        // An offset larger than the value wraps forward, not negative.
        assert!((cyclic_angle(0.0, 12.0, 1.0) - dec).abs() < EPS);
    }

    #[test]
    fn test_quarter_turn() {
        let (s, c) = cyclic_pair(6.0, 24.0, 0.0);
        assert!((s - 1.0).abs() < EPS);
        assert!(c.abs() < EPS);
    }

    #[test]
    fn test_encode_table_drops_sources() {
        let t = Table::new(
            vec!["hr".into(), "temp".into(), "mnth".into()],
            vec![vec!["0".into(), "0.3".into(), "1".into()], vec!["6".into(), "0.5".into(), "4".into()]],
        )
        .unwrap();
        let periods: IndexMap<String, u32> =
            [("hr".to_string(), 24), ("mnth".to_string(), 12)].into_iter().collect();
        let offsets: IndexMap<String, i64> = [("mnth".to_string(), 1)].into_iter().collect();

        let out = cyclic_encode(&t, &periods, &offsets, true).unwrap();
        assert_eq!(
            out.columns(),
            &["temp", "hr_sin", "hr_cos", "mnth_sin", "mnth_cos"].map(String::from)
        );
        let hr_cos = out.numeric_column("hr_cos").unwrap();
        assert!((hr_cos[0] - 1.0).abs() < EPS);
        let mnth_sin = out.numeric_column("mnth_sin").unwrap();
        assert!(mnth_sin[0].abs() < EPS);
        assert!((mnth_sin[1] - 1.0).abs() < EPS);

        let kept = cyclic_encode(&t, &periods, &offsets, false).unwrap();
        assert!(kept.has_column("hr"));
    }

    #[test]
    fn test_missing_column_fails() {
        let t = Table::new(vec!["temp".into()], vec![vec!["1".into()]]).unwrap();
        let periods: IndexMap<String, u32> = [("hr".to_string(), 24)].into_iter().collect();
        assert!(cyclic_encode(&t, &periods, &IndexMap::new(), true).is_err());
    }
}
