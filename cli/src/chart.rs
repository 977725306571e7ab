//! Stacked-percentage SVG chart of election results.
//!
//! One bar per candidate, Awful at the bottom and Excellent at the top,
//! scaled against a shared normalization total.

use mjvs_types::{Grade, GRADE_COUNT};
use std::fmt::Write as _;
use std::path::Path;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const LEFT: f64 = 70.0;
const RIGHT: f64 = 140.0;
const TOP: f64 = 30.0;
const BOTTOM: f64 = 50.0;

/// Fill colour per grade, Excellent first.
const COLOURS: [&str; GRADE_COUNT] = [
    "#1B5E20", "#4CAF50", "#9E9D24", "#FDD835", "#FB8C00", "#E53935", "#B71C1C",
];

/// Render `counts[candidate][grade]` as percentages of `total`.
pub fn render(counts: &[[u64; GRADE_COUNT]], total: u64) -> String {
    let plot_w = WIDTH - LEFT - RIGHT;
    let plot_h = HEIGHT - TOP - BOTTOM;
    let y_of = |pct: f64| TOP + plot_h * (1.0 - pct.clamp(0.0, 100.0) / 100.0);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    // Axis and gridlines.
    for tick in (0..=100).step_by(10) {
        let y = y_of(tick as f64);
        let _ = writeln!(
            svg,
            r##"<line x1="{LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{tick}</text>"##,
            LEFT + plot_w,
            LEFT - 6.0,
            y + 4.0,
        );
    }
    let _ = writeln!(
        svg,
        r#"<text transform="translate(18 {:.1}) rotate(-90)" font-size="13" text-anchor="middle">Votes (%)</text>"#,
        TOP + plot_h / 2.0
    );

    let slot = if counts.is_empty() {
        plot_w
    } else {
        plot_w / counts.len() as f64
    };
    let bar_w = slot * 0.6;

    for (candidate, row) in counts.iter().enumerate() {
        let x = LEFT + slot * candidate as f64 + (slot - bar_w) / 2.0;
        let mut base = 0.0;
        // Awful is drawn first so it sits at the bottom.
        for grade in Grade::ALL.iter().rev() {
            let pct = percentage(row[grade.index()], total);
            if pct <= 0.0 {
                continue;
            }
            let (y_top, y_bottom) = (y_of(base + pct), y_of(base));
            let _ = writeln!(
                svg,
                r#"<rect x="{x:.1}" y="{y_top:.1}" width="{bar_w:.1}" height="{:.1}" fill="{}"><title>{} {pct:.1}%</title></rect>"#,
                y_bottom - y_top,
                COLOURS[grade.index()],
                grade.label(),
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="12" font-weight="bold" fill="white" text-anchor="middle">{pct:.1}%</text>"#,
                x + bar_w / 2.0,
                (y_top + y_bottom) / 2.0 + 4.0,
            );
            base += pct;
        }
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">Candidate {}</text>"#,
            x + bar_w / 2.0,
            TOP + plot_h + 22.0,
            candidate + 1
        );
    }

    let median = y_of(50.0);
    let _ = writeln!(
        svg,
        r#"<line x1="{LEFT}" y1="{median:.1}" x2="{:.1}" y2="{median:.1}" stroke="black" stroke-width="2" stroke-dasharray="5,5"/><text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">50% Median</text>"#,
        LEFT + plot_w,
        LEFT + plot_w,
        median - 6.0,
    );

    // Legend, Excellent on top to match the stacking.
    for (i, grade) in Grade::ALL.iter().enumerate() {
        let y = TOP + 20.0 * i as f64;
        let lx = WIDTH - RIGHT + 20.0;
        let _ = writeln!(
            svg,
            r#"<rect x="{lx:.1}" y="{y:.1}" width="14" height="14" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="12">{}</text>"#,
            COLOURS[grade.index()],
            lx + 20.0,
            y + 11.0,
            grade.label(),
        );
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn write(path: &Path, counts: &[[u64; GRADE_COUNT]], total: u64) -> std::io::Result<()> {
    std::fs::write(path, render(counts, total))
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_segments_are_not_labelled() {
        let svg = render(&[[1, 0, 0, 3, 0, 0, 0]], 4);
        assert!(svg.contains("25.0%"));
        assert!(svg.contains("75.0%"));
        assert!(!svg.contains(">0.0%<"));
    }

    #[test]
    fn awful_is_stacked_below_excellent() {
        let svg = render(&[[1, 0, 0, 0, 0, 0, 1]], 2);
        let awful = svg.find(COLOURS[6]).unwrap_or(usize::MAX);
        let excellent = svg.find(r##"fill="#1B5E20"><title>"##).unwrap_or(0);
        assert!(awful < excellent);
    }

    #[test]
    fn median_line_is_dashed() {
        let svg = render(&[[0; GRADE_COUNT]], 0);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("50% Median"));
        assert!(svg.contains("Candidate 1"));
    }

    #[test]
    fn zero_total_renders_empty_bars() {
        let svg = render(&[[0; GRADE_COUNT], [0; GRADE_COUNT]], 0);
        assert!(!svg.contains("<title>"));
        assert!(svg.contains("Candidate 2"));
    }

    #[test]
    fn chart_is_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        write(&path, &[[2, 0, 0, 0, 0, 0, 0]], 2).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("100.0%"));
    }
}
