use crate::colors::ColorTable;
use crate::stats::LanguageTally;
use anyhow::{Context, Result};
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Languages plotted in the pie.
pub const TOP_LANGUAGES: usize = 8;

pub const PLACEHOLDER_TEXT: &str = "No language data";

/// Minimum canvas width; grows to fit long labels.
const WIDTH: f64 = 760.0;
const HEIGHT: f64 = 440.0;
const CENTER_Y: f64 = 225.0;
const RADIUS: f64 = 140.0;
const ELBOW_RADIUS: f64 = 158.0;
const LEADER_RUN: f64 = 16.0;
const LABEL_GAP: f64 = 4.0;
// Upper estimate of one glyph at 13px sans-serif.
const CHAR_WIDTH: f64 = 7.5;
const MARGIN: f64 = 16.0;
const LEGEND_GAP: f64 = 32.0;
const LEGEND_TITLE: &str = "Languages";
const LEGEND_Y: f64 = 60.0;
const LEGEND_ROW: f64 = 24.0;
const SWATCH: f64 = 14.0;
const TEXT_COLOR: &str = "#24292f";
const LEADER_COLOR: &str = "#6a737d";

/// Slice colors for languages missing from the color table, by slice index.
const DEFAULT_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub language: String,
    /// Share of the plotted languages, not of the whole tally.
    pub percent: f64,
    pub color: String,
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Top languages with their colors and percentages of the plotted subset.
pub fn slices(tally: &LanguageTally, colors: &ColorTable) -> Vec<Slice> {
    let top = tally.most_common(TOP_LANGUAGES);
    let sum: u64 = top.iter().map(|(_, b)| *b).sum();
    if sum == 0 {
        return Vec::new();
    }

    top.iter()
        .enumerate()
        .map(|(i, (lang, bytes))| Slice {
            language: lang.to_string(),
            percent: *bytes as f64 / sum as f64 * 100.0,
            color: colors
                .get(lang)
                .unwrap_or(DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()])
                .to_string(),
        })
        .collect()
}

/// Point on a circle around (`cx`, `CENTER_Y`); angle in degrees,
/// counter-clockwise from 3 o'clock.
fn polar(cx: f64, radius: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees * PI / 180.0;
    (cx + radius * rad.cos(), CENTER_Y - radius * rad.sin())
}

/// Rough rendered width of `s` at the chart font size.
fn text_width(s: &str) -> f64 {
    s.chars().count() as f64 * CHAR_WIDTH
}

/// One outside label and its leader line.
#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    /// Text sits right of the pie and is start-anchored.
    pub right: bool,
    pub edge: (f64, f64),
    pub elbow: (f64, f64),
    pub leader_end_x: f64,
    pub text_x: f64,
}

#[cfg(test)]
impl Label {
    /// Estimated horizontal span of the label text.
    pub fn extent(&self) -> (f64, f64) {
        let w = text_width(&self.text);
        if self.right {
            (self.text_x, self.text_x + w)
        } else {
            (self.text_x - w, self.text_x)
        }
    }
}

/// Horizontal placement of pie, labels and legend, sized to fit the labels.
#[derive(Debug, Clone)]
pub struct Layout {
    pub center_x: f64,
    pub legend_x: f64,
    pub width: f64,
    pub labels: Vec<Label>,
}

pub fn layout(slices: &[Slice]) -> Layout {
    // Label angle, side, text and how far it reaches from the pie center.
    let mut placed = Vec::with_capacity(slices.len());
    let mut left_reach = RADIUS;
    let mut right_reach = RADIUS;
    let mut start: f64 = 90.0;
    for s in slices {
        let sweep = s.percent * 3.6;
        let mid = start + sweep / 2.0;
        start += sweep;

        let text = format!("{} {:.1}%", s.language, s.percent);
        let elbow_dx = ELBOW_RADIUS * mid.to_radians().cos();
        let right = elbow_dx >= 0.0;
        let reach = elbow_dx.abs() + LEADER_RUN + LABEL_GAP + text_width(&text);
        if right {
            right_reach = right_reach.max(reach);
        } else {
            left_reach = left_reach.max(reach);
        }
        placed.push((mid, right, text));
    }

    let center_x = MARGIN + left_reach;
    let legend_x = center_x + right_reach + LEGEND_GAP;
    let legend_text = slices
        .iter()
        .map(|s| text_width(&s.language))
        .fold(text_width(LEGEND_TITLE), f64::max);
    let width = (legend_x + SWATCH + 8.0 + legend_text + MARGIN).max(WIDTH);

    let labels = placed
        .into_iter()
        .map(|(mid, right, text)| {
            let edge = polar(center_x, RADIUS, mid);
            let elbow = polar(center_x, ELBOW_RADIUS, mid);
            let (leader_end_x, text_x) = if right {
                let end = elbow.0 + LEADER_RUN;
                (end, end + LABEL_GAP)
            } else {
                let end = elbow.0 - LEADER_RUN;
                (end, end - LABEL_GAP)
            };
            Label {
                text,
                right,
                edge,
                elbow,
                leader_end_x,
                text_x,
            }
        })
        .collect();

    Layout {
        center_x,
        legend_x,
        width,
        labels,
    }
}

fn open_svg(out: &mut String, width: f64) {
    let _ = write!(
        out,
        r##"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{width:.0}" height="{HEIGHT}" viewBox="0 0 {width:.0} {HEIGHT}"
     font-family="-apple-system,BlinkMacSystemFont,Segoe UI,Helvetica,Arial,sans-serif"
     font-size="13px">
<rect width="{width:.0}" height="{HEIGHT}" fill="#ffffff"/>
"##
    );
}

/// SVG shown when there is nothing to plot.
pub fn placeholder_svg() -> String {
    let mut out = String::new();
    open_svg(&mut out, WIDTH);
    let _ = write!(
        out,
        r#"<text x="{x}" y="{y}" text-anchor="middle" dominant-baseline="middle" fill="{TEXT_COLOR}" font-size="18px">{PLACEHOLDER_TEXT}</text>
</svg>
"#,
        x = WIDTH / 2.0,
        y = HEIGHT / 2.0,
    );
    out
}

/// Pie chart of the top languages with outside labels, leader lines and a legend.
pub fn render_language_chart(tally: &LanguageTally, colors: &ColorTable) -> String {
    let slices = slices(tally, colors);
    if slices.is_empty() {
        return placeholder_svg();
    }
    let layout = layout(&slices);
    let cx = layout.center_x;

    let mut out = String::new();
    open_svg(&mut out, layout.width.ceil());

    // Wedges
    out.push_str("<g stroke=\"#ffffff\" stroke-width=\"1\">\n");
    let mut start: f64 = 90.0;
    for s in &slices {
        let sweep = s.percent * 3.6;
        let end = start + sweep;
        let fill = escape_xml(&s.color);

        if sweep >= 359.999 {
            let _ = writeln!(
                out,
                r#"<circle cx="{cx:.2}" cy="{CENTER_Y}" r="{RADIUS}" fill="{fill}"/>"#
            );
        } else if sweep > 0.0 {
            let (x0, y0) = polar(cx, RADIUS, start);
            let (x1, y1) = polar(cx, RADIUS, end);
            let large = if sweep > 180.0 { 1 } else { 0 };
            let _ = writeln!(
                out,
                r#"<path d="M {cx:.2} {CENTER_Y:.2} L {x0:.2} {y0:.2} A {RADIUS} {RADIUS} 0 {large} 0 {x1:.2} {y1:.2} Z" fill="{fill}"/>"#
            );
        }
        start = end;
    }
    out.push_str("</g>\n");

    // Labels with leader lines
    for l in &layout.labels {
        let (ex, ey) = l.edge;
        let (kx, ky) = l.elbow;
        let lx = l.leader_end_x;
        let tx = l.text_x;
        let anchor = if l.right { "start" } else { "end" };
        let _ = writeln!(
            out,
            r#"<polyline points="{ex:.2},{ey:.2} {kx:.2},{ky:.2} {lx:.2},{ky:.2}" fill="none" stroke="{LEADER_COLOR}" stroke-width="1"/>"#
        );
        let _ = writeln!(
            out,
            r#"<text x="{tx:.2}" y="{ky:.2}" text-anchor="{anchor}" dominant-baseline="middle" fill="{TEXT_COLOR}">{}</text>"#,
            escape_xml(&l.text)
        );
    }

    // Legend
    let legend_x = layout.legend_x;
    let _ = writeln!(
        out,
        r#"<text x="{legend_x:.2}" y="{y}" fill="{TEXT_COLOR}" font-weight="bold">{LEGEND_TITLE}</text>"#,
        y = LEGEND_Y - LEGEND_ROW
    );
    for (i, s) in slices.iter().enumerate() {
        let y = LEGEND_Y + i as f64 * LEGEND_ROW;
        let _ = writeln!(
            out,
            r#"<rect x="{legend_x:.2}" y="{ry:.2}" width="{SWATCH}" height="{SWATCH}" fill="{}"/>
<text x="{tx:.2}" y="{y}" dominant-baseline="middle" fill="{TEXT_COLOR}">{}</text>"#,
            escape_xml(&s.color),
            escape_xml(&s.language),
            ry = y - SWATCH / 2.0,
            tx = legend_x + SWATCH + 8.0,
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Render the chart (or placeholder) and overwrite `path`, creating parent dirs.
pub fn save_language_chart(tally: &LanguageTally, colors: &ColorTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(path, render_language_chart(tally, colors))
        .with_context(|| format!("Failed to write chart {}", path.display()))
}
