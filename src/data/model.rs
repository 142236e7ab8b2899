use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WaveType – P or S
// ---------------------------------------------------------------------------

/// Seismic wave type a velocity sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WaveType {
    #[serde(rename = "VP")]
    Vp,
    #[serde(rename = "VS")]
    Vs,
}

impl WaveType {
    pub const ALL: [WaveType; 2] = [WaveType::Vp, WaveType::Vs];

    /// Canonical upper-case spelling used in requests and imports.
    pub fn as_str(self) -> &'static str {
        match self {
            WaveType::Vp => "VP",
            WaveType::Vs => "VS",
        }
    }

    /// Column label used by the delimited 3D export.
    pub fn column_label(self) -> &'static str {
        match self {
            WaveType::Vp => "Vp",
            WaveType::Vs => "Vs",
        }
    }
}

impl fmt::Display for WaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a wave type spelling other than `VP` / `VS`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wave_type must be VP or VS, got {0}")]
pub struct ParseWaveTypeError(pub String);

impl FromStr for WaveType {
    type Err = ParseWaveTypeError;

    /// Strict parse: only the exact spellings `VP` and `VS` are accepted.
    /// Importers normalise case before calling this.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VP" => Ok(WaveType::Vp),
            "VS" => Ok(WaveType::Vs),
            other => Err(ParseWaveTypeError(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// VelocityModel1D – one layer of a depth/velocity profile
// ---------------------------------------------------------------------------

/// A single 1D velocity sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityModel1D {
    /// Depth in km; negative above sea level.
    pub depth: f64,
    /// Velocity in km/s.
    pub velocity: f64,
    pub wave_type: WaveType,
    /// Network / organisation identifier.
    pub nfo: String,
    pub author: String,
}

impl VelocityModel1D {
    /// Duplicate-detection key: the full tuple.
    pub fn key(&self) -> Key1D {
        Key1D {
            depth: float_key(self.depth),
            velocity: float_key(self.velocity),
            wave_type: self.wave_type,
            nfo: self.nfo.clone(),
            author: self.author.clone(),
        }
    }

    /// Stable total order: depth, wave type, velocity, nfo, author.
    pub fn fetch_order(a: &Self, b: &Self) -> Ordering {
        a.depth
            .total_cmp(&b.depth)
            .then(a.wave_type.cmp(&b.wave_type))
            .then(a.velocity.total_cmp(&b.velocity))
            .then_with(|| a.nfo.cmp(&b.nfo))
            .then_with(|| a.author.cmp(&b.author))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key1D {
    depth: u64,
    velocity: u64,
    wave_type: WaveType,
    nfo: String,
    author: String,
}

// ---------------------------------------------------------------------------
// VelocityModel3D – one grid node of a VP or VS model
// ---------------------------------------------------------------------------

/// Default `r` when an import source carries no value.
pub const DEFAULT_R: f64 = 1.0;

/// A single 3D grid node. The wave type is implied by the collection the
/// row lives in, so `velocity` is vp or vs accordingly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityModel3D {
    pub longitude: f64,
    pub latitude: f64,
    pub depth: f64,
    pub velocity: f64,
    #[serde(default = "default_r")]
    pub r: f64,
    pub nfo: String,
    pub author: String,
}

fn default_r() -> f64 {
    DEFAULT_R
}

impl VelocityModel3D {
    /// Duplicate-detection key within one wave-type collection.
    pub fn key(&self) -> Key3D {
        Key3D {
            longitude: float_key(self.longitude),
            latitude: float_key(self.latitude),
            depth: float_key(self.depth),
            nfo: self.nfo.clone(),
            author: self.author.clone(),
        }
    }

    /// Stable total order: longitude, latitude, depth, nfo, author.
    pub fn fetch_order(a: &Self, b: &Self) -> Ordering {
        a.longitude
            .total_cmp(&b.longitude)
            .then(a.latitude.total_cmp(&b.latitude))
            .then(a.depth.total_cmp(&b.depth))
            .then_with(|| a.nfo.cmp(&b.nfo))
            .then_with(|| a.author.cmp(&b.author))
    }

    pub fn has_default_r(&self) -> bool {
        self.r == DEFAULT_R
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key3D {
    longitude: u64,
    latitude: u64,
    depth: u64,
    nfo: String,
    author: String,
}

// ---------------------------------------------------------------------------
// AuthorBibref
// ---------------------------------------------------------------------------

/// Bibliographic reference for an author string. Joined to velocity rows by
/// value, not by a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBibref {
    pub author: String,
    pub bibref: String,
}

/// Bit pattern used for hashing floats; `-0.0` and `0.0` collapse together.
fn float_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}
