use super::{preamble, Title};
use crate::data::model::{VelocityModel3D, WaveType};
use crate::data::page::Page;

pub const DELIMITER: &str = "|";

/// The `R` column is shown only when asked for *and* some row carries a
/// non-default value.
pub fn should_include_r(requested: bool, rows: &[VelocityModel3D]) -> bool {
    requested && rows.iter().any(|row| !row.has_default_r())
}

/// Shortest round-trip decimal, always with a fractional part (`1.0`, `-0.25`).
pub fn natural(value: f64) -> String {
    format!("{value:?}")
}

pub fn column_header(wave_type: WaveType, include_r: bool) -> String {
    let mut columns = vec!["Longitude", "Latitude", "Depth", wave_type.column_label()];
    if include_r {
        columns.push("R");
    }
    columns.join(DELIMITER)
}

fn data_row(row: &VelocityModel3D, include_r: bool) -> String {
    let mut fields = vec![
        natural(row.longitude),
        natural(row.latitude),
        natural(row.depth),
        natural(row.velocity),
    ];
    if include_r {
        fields.push(natural(row.r));
    }
    fields.join(DELIMITER)
}

/// Full delimited body: title, optional banner, column header, rows in
/// fetch order.
pub fn render(
    title: &Title,
    wave_type: WaveType,
    include_r_requested: bool,
    page: &Page<VelocityModel3D>,
) -> String {
    let include_r = should_include_r(include_r_requested, &page.rows);
    let mut lines = preamble(title, page);
    lines.push(column_header(wave_type, include_r));
    lines.extend(page.rows.iter().map(|row| data_row(row, include_r)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Window;

    fn node(longitude: f64, r: f64) -> VelocityModel3D {
        VelocityModel3D {
            longitude,
            latitude: 46.5,
            depth: 10.0,
            velocity: 3.45,
            r,
            nfo: "TEST_NFO".into(),
            author: "test_3d".into(),
        }
    }

    fn page(rows: Vec<VelocityModel3D>) -> Page<VelocityModel3D> {
        let total = rows.len();
        Page {
            rows,
            total,
            window: Window::default(),
        }
    }

    fn title() -> Title {
        Title::Request {
            author: "test_3d".into(),
            nfo: "TEST".into(),
        }
    }

    #[test]
    fn r_column_needs_both_conditions() {
        let defaults = vec![node(7.0, 1.0), node(8.0, 1.0)];
        let mixed = vec![node(7.0, 1.0), node(8.0, 0.5)];
        assert!(!should_include_r(true, &defaults));
        assert!(!should_include_r(false, &mixed));
        assert!(!should_include_r(false, &defaults));
        assert!(should_include_r(true, &mixed));
    }

    #[test]
    fn natural_keeps_a_fractional_digit() {
        assert_eq!(natural(1.0), "1.0");
        assert_eq!(natural(0.5), "0.5");
        assert_eq!(natural(-122.25), "-122.25");
        assert_eq!(natural(6.1), "6.1");
    }

    #[test]
    fn vs_with_one_non_default_r_shows_r_everywhere() {
        let rows = vec![
            node(7.0, 1.0),
            node(7.5, 0.5),
            node(8.0, 1.0),
            node(8.5, 1.0),
            node(9.0, 1.0),
        ];
        let body = render(&title(), WaveType::Vs, true, &page(rows));
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "test_3d model - TEST");
        assert_eq!(lines[1], "Longitude|Latitude|Depth|Vs|R");
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2], "7.0|46.5|10.0|3.45|1.0");
        assert_eq!(lines[3], "7.5|46.5|10.0|3.45|0.5");
        assert!(lines[2..].iter().all(|l| l.split('|').count() == 5));
    }

    #[test]
    fn r_requested_but_all_default_is_suppressed() {
        let body = render(&title(), WaveType::Vp, true, &page(vec![node(7.0, 1.0)]));
        assert_eq!(
            body,
            "test_3d model - TEST\nLongitude|Latitude|Depth|Vp\n7.0|46.5|10.0|3.45"
        );
    }

    #[test]
    fn banner_sits_between_title_and_columns() {
        let p = Page {
            rows: vec![node(7.0, 1.0), node(8.0, 1.0)],
            total: 10,
            window: Window { limit: 2, offset: 4 },
        };
        let body = render(&title(), WaveType::Vp, false, &p);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[1], "# Showing 5-6 of 10 records (limit=2, offset=4)");
        assert_eq!(lines[2], "Longitude|Latitude|Depth|Vp");
    }
}
