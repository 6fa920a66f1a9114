//! Donut charts of a top-N report, one by packet count and one by bytes.
//!
//! A service keeps the same color in both charts. Past ten slices the
//! smallest ones are folded into a single "Other" slice.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::dto::ServiceRow;

pub const PACKET_CHART: &str = "packet_composition.svg";
pub const BYTE_CHART: &str = "byte_composition.svg";

const MAX_SLICES: usize = 10;
const FOLDED_LABEL: &str = "Other";

const WIDTH: u32 = 960;
const HEIGHT: u32 = 600;
const CENTER: (i32, i32) = (300, 330);
const OUTER_RADIUS: f64 = 230.0;
const INNER_RADIUS: f64 = OUTER_RADIUS * 0.6;
const START_ANGLE: f64 = 90.0;
const LEGEND_X: i32 = 600;
const LEGEND_Y: i32 = 110;

const FALLBACK_COLOR: RGBColor = RGBColor(0x80, 0x80, 0x80);

// matplotlib's tab20
const PALETTE: [RGBColor; 20] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xae, 0xc7, 0xe8),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0xff, 0xbb, 0x78),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0x98, 0xdf, 0x8a),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0xff, 0x98, 0x96),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0xc5, 0xb0, 0xd5),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xc4, 0x9c, 0x94),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0xf7, 0xb6, 0xd2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xc7, 0xc7, 0xc7),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0xdb, 0xdb, 0x8d),
    RGBColor(0x17, 0xbe, 0xcf),
    RGBColor(0x9e, 0xda, 0xe5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Packets,
    Bytes,
}

impl Metric {
    fn of(self, row: &ServiceRow) -> u64 {
        match self {
            Metric::Packets => row.packets,
            Metric::Bytes => row.bytes,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Metric::Packets => "NetFlow Composition by Packet Count",
            Metric::Bytes => "NetFlow Composition by Data Volume (Bytes)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: String,
    pub value: u64,
    pub color: RGBColor,
}

/// One color per distinct service, in order of first appearance.
pub fn color_map(rows: &[ServiceRow]) -> HashMap<String, RGBColor> {
    let mut colors = HashMap::new();
    for row in rows {
        let next = PALETTE[colors.len() % PALETTE.len()];
        colors.entry(row.service.clone()).or_insert(next);
    }
    colors
}

/// Slices for one metric, largest first. Empty slices are left out.
pub fn slices(rows: &[ServiceRow], metric: Metric, colors: &HashMap<String, RGBColor>) -> Vec<Slice> {
    let mut ranked: Vec<(&str, u64)> = rows
        .iter()
        .map(|row| (row.service.as_str(), metric.of(row)))
        .filter(|(_, value)| *value > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut folded = 0u64;
    if ranked.len() > MAX_SLICES + 1 {
        folded = ranked.split_off(MAX_SLICES).iter().map(|(_, v)| v).sum();
    }

    let mut slices: Vec<Slice> = ranked
        .into_iter()
        .map(|(label, value)| Slice {
            label: label.to_string(),
            value,
            color: colors.get(label).copied().unwrap_or(FALLBACK_COLOR),
        })
        .collect();
    if folded > 0 {
        slices.push(Slice {
            label: FOLDED_LABEL.to_string(),
            value: folded,
            color: colors.get(FOLDED_LABEL).copied().unwrap_or(FALLBACK_COLOR),
        });
    }
    slices
}

pub fn legend_label(slice: &Slice, total: u64) -> String {
    let share = if total == 0 {
        0.0
    } else {
        slice.value as f64 / total as f64 * 100.0
    };
    format!("{:<15} ({:.1}%)", slice.label, share)
}

fn wedge(start_deg: f64, sweep_deg: f64) -> Vec<(i32, i32)> {
    let steps = sweep_deg.ceil().max(2.0) as usize;
    let point = |radius: f64, deg: f64| {
        let rad = deg.to_radians();
        (
            CENTER.0 + (radius * rad.cos()).round() as i32,
            CENTER.1 - (radius * rad.sin()).round() as i32,
        )
    };

    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        points.push(point(OUTER_RADIUS, start_deg + sweep_deg * i as f64 / steps as f64));
    }
    for i in (0..=steps).rev() {
        points.push(point(INNER_RADIUS, start_deg + sweep_deg * i as f64 / steps as f64));
    }
    points
}

fn draw(path: &Path, title: &str, slices: &[Slice]) -> std::result::Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    root.draw(&Text::new(title.to_string(), (30, 24), ("sans-serif", 26).into_font()))?;

    let total: u64 = slices.iter().map(|s| s.value).sum();
    let mut start = START_ANGLE;
    for slice in slices {
        let sweep = 360.0 * slice.value as f64 / total as f64;
        root.draw(&Polygon::new(wedge(start, sweep), slice.color.filled()))?;
        start += sweep;
    }

    root.draw(&Text::new("Services", (LEGEND_X, LEGEND_Y), ("sans-serif", 20).into_font()))?;
    for (i, slice) in slices.iter().enumerate() {
        let y = LEGEND_Y + 34 + i as i32 * 28;
        root.draw(&Rectangle::new([(LEGEND_X, y), (LEGEND_X + 18, y + 18)], slice.color.filled()))?;
        root.draw(&Text::new(
            legend_label(slice, total),
            (LEGEND_X + 28, y + 2),
            ("monospace", 16).into_font(),
        ))?;
    }
    root.present()?;
    Ok(())
}

/// Writes the packet and byte charts into `dir`, creating it if needed, and
/// returns their paths. A metric with nothing to show is skipped with a warning.
pub fn render(rows: &[ServiceRow], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| Error::Output {
        path: dir.to_path_buf(),
        source,
    })?;
    let colors = color_map(rows);
    let mut written = Vec::new();
    for (metric, file) in [(Metric::Packets, PACKET_CHART), (Metric::Bytes, BYTE_CHART)] {
        let chart = slices(rows, metric, &colors);
        if chart.is_empty() {
            warn!(?metric, "no data to chart");
            continue;
        }
        let path = dir.join(file);
        draw(&path, metric.title(), &chart).map_err(|e| Error::Chart {
            path: path.clone(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "chart saved");
        written.push(path);
    }
    Ok(written)
}

/// Reads the rows back from a top-N report file. The title, the header and
/// anything else that is not `service,packets,bytes` is ignored.
pub fn read_report<R: Read>(source: R) -> csv::Result<Vec<ServiceRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != 3 {
            continue;
        }
        let (Ok(packets), Ok(bytes)) = (record[1].trim().parse(), record[2].trim().parse()) else {
            continue;
        };
        rows.push(ServiceRow {
            service: record[0].trim().to_string(),
            packets,
            bytes,
        });
    }
    Ok(rows)
}

/// Draws both charts for the report file at `report_path`.
pub fn render_report_file(report_path: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |source: csv::Error| Error::ReportRead {
        path: report_path.to_path_buf(),
        source,
    };
    let file = File::open(report_path).map_err(|e| read_error(e.into()))?;
    let rows = read_report(file).map_err(read_error)?;
    if rows.is_empty() {
        warn!(path = %report_path.display(), "report has no service rows");
    }
    render(&rows, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(service: &str, packets: u64, bytes: u64) -> ServiceRow {
        ServiceRow {
            service: service.to_string(),
            packets,
            bytes,
        }
    }

    fn workdir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("svctop-chart-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn colors_match_across_metrics() {
        // ordered differently by packets and by bytes
        let rows = vec![row("HTTPS", 10, 9000), row("DNS", 800, 8000), row("SSH", 50, 500)];
        let colors = color_map(&rows);
        let by_packets = slices(&rows, Metric::Packets, &colors);
        let by_bytes = slices(&rows, Metric::Bytes, &colors);
        assert_eq!(by_packets[0].label, "DNS");
        assert_eq!(by_bytes[0].label, "HTTPS");
        for slice in &by_packets {
            let same = by_bytes.iter().find(|s| s.label == slice.label).unwrap();
            assert_eq!(same.color, slice.color);
        }
        assert_ne!(colors["HTTPS"], colors["DNS"]);
    }

    #[test]
    fn more_than_eleven_slices_fold() {
        let rows: Vec<ServiceRow> = (1..=14).map(|i| row(&format!("svc{i}"), i, i * 100)).collect();
        let chart = slices(&rows, Metric::Bytes, &color_map(&rows));
        assert_eq!(chart.len(), MAX_SLICES + 1);
        assert_eq!(chart[0].value, 1400);
        let other = chart.last().unwrap();
        assert_eq!(other.label, FOLDED_LABEL);
        assert_eq!(other.value, 100 + 200 + 300 + 400);
        assert_eq!(other.color, FALLBACK_COLOR);

        let eleven = &rows[..11];
        assert_eq!(slices(eleven, Metric::Bytes, &color_map(eleven)).len(), 11);
    }

    #[test]
    fn empty_slices_dropped() {
        let rows = vec![row("A", 0, 0), row("B", 3, 30)];
        let chart = slices(&rows, Metric::Packets, &color_map(&rows));
        assert_eq!(chart.len(), 1);
        assert_eq!(chart[0].label, "B");
    }

    #[test]
    fn legend_shows_share() {
        let slice = Slice {
            label: "dns".into(),
            value: 1,
            color: FALLBACK_COLOR,
        };
        assert_eq!(legend_label(&slice, 4), "dns             (25.0%)");
    }

    #[test]
    fn reads_rows_from_report_file() {
        let text = "--- Top 2 Services Report (by Bytes) ---\n\
                    Service,Total Packets,Total Bytes\n\
                    HTTP,15,1500\n\
                    DNS,4,400\n\
                    other,6,600\n";
        let rows = read_report(text.as_bytes()).unwrap();
        assert_eq!(rows, vec![row("HTTP", 15, 1500), row("DNS", 4, 400), row("other", 6, 600)]);
    }

    #[test]
    fn renders_both_charts() {
        let dir = workdir("render");
        let rows = vec![row("HTTP", 15, 1500), row("DNS", 4, 400), row("other", 6, 600)];
        let written = render(&rows, &dir).unwrap();
        assert_eq!(written, vec![dir.join(PACKET_CHART), dir.join(BYTE_CHART)]);

        let svg = std::fs::read_to_string(dir.join(BYTE_CHART)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("NetFlow Composition by Data Volume (Bytes)"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn nothing_to_draw() {
        let dir = workdir("empty");
        assert!(render(&[], &dir).unwrap().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
