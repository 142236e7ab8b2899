//! VELEST model file encoder.
//!
//! Layout of one block:
//!
//! ```text
//!  8        vel,depth,vdamp,phase (f5.2,5x,f7.2,2x,f7.3,3x,a1)
//!  4.80       -3.00   001.000           P-VELOCITY MODEL
//!  4.80        0.00   001.000
//! ```
//!
//! The VS block repeats the layout with a bare count line and the
//! `S-VELOCITY MODEL` label. Output must match byte for byte.

use super::{preamble, Title};
use crate::data::model::{VelocityModel1D, WaveType};
use crate::data::page::Page;

pub const VELOCITY_WIDTH: usize = 5;
pub const VELOCITY_PRECISION: usize = 2;
pub const DEPTH_GAP: usize = 5;
pub const DEPTH_WIDTH: usize = 7;
pub const DEPTH_PRECISION: usize = 2;
pub const DAMPING_GAP: usize = 3;
/// Constant damping column.
pub const DAMPING: &str = "001.000";
pub const LABEL_GAP: usize = 11;
pub const COUNT_PREFIX: &str = " ";
pub const COUNT_GAP: usize = 8;
pub const LAYOUT_DESCRIPTOR: &str = "vel,depth,vdamp,phase (f5.2,5x,f7.2,2x,f7.3,3x,a1)";

fn label(wave_type: WaveType) -> &'static str {
    match wave_type {
        WaveType::Vp => "P-VELOCITY MODEL",
        WaveType::Vs => "S-VELOCITY MODEL",
    }
}

fn count_line(wave_type: WaveType, count: usize) -> String {
    match wave_type {
        WaveType::Vp => format!(
            "{COUNT_PREFIX}{count}{blank:gap$}{LAYOUT_DESCRIPTOR}",
            blank = "",
            gap = COUNT_GAP
        ),
        WaveType::Vs => format!("{COUNT_PREFIX}{count}"),
    }
}

fn layer_line(row: &VelocityModel1D, label: Option<&str>) -> String {
    let mut line = format!(
        "{velocity:>vw$.vp$}{blank:dg$}{depth:>dw$.dp$}{blank:mg$}{DAMPING}",
        velocity = row.velocity,
        depth = row.depth,
        blank = "",
        vw = VELOCITY_WIDTH,
        vp = VELOCITY_PRECISION,
        dg = DEPTH_GAP,
        dw = DEPTH_WIDTH,
        dp = DEPTH_PRECISION,
        mg = DAMPING_GAP,
    );
    if let Some(label) = label {
        line.push_str(&" ".repeat(LABEL_GAP));
        line.push_str(label);
    }
    line
}

/// Encode the VP then VS blocks. A wave type with no rows yields no lines.
pub fn encode_blocks(rows: &[VelocityModel1D]) -> Vec<String> {
    let mut lines = Vec::new();
    for wave_type in WaveType::ALL {
        let mut block: Vec<&VelocityModel1D> =
            rows.iter().filter(|r| r.wave_type == wave_type).collect();
        if block.is_empty() {
            continue;
        }
        block.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        lines.push(count_line(wave_type, block.len()));
        for (i, row) in block.iter().enumerate() {
            let tag = (i == 0).then(|| label(wave_type));
            lines.push(layer_line(row, tag));
        }
    }
    lines
}

/// Full VELEST body: title, optional banner, blocks.
pub fn render(title: &Title, page: &Page<VelocityModel1D>) -> String {
    let mut lines = preamble(title, page);
    lines.extend(encode_blocks(&page.rows));
    lines.join("\n")
}
