//! Stage kinds a graph file may declare.

use core::fmt;

/// The kind of work a declared stage does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Routing point with no own stage; blocks enter the graph here.
    Input,
    /// Spectrum analyser (passthrough with a throttled chart).
    Spectrum,
    /// Fixed-tap FIR delay line.
    Fir,
    /// Constant gain.
    Gain,
    /// Unchanged copy.
    Passthrough,
}

impl StageKind {
    /// All kinds, in documentation order.
    pub const ALL: [StageKind; 5] = [
        StageKind::Input,
        StageKind::Spectrum,
        StageKind::Fir,
        StageKind::Gain,
        StageKind::Passthrough,
    ];

    /// Parse a kind name. Accepts a few aliases (`fft`, `analyser`, `filter`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "input" | "node" => Some(Self::Input),
            "spectrum" | "fft" | "analyser" | "analyzer" => Some(Self::Spectrum),
            "fir" | "filter" => Some(Self::Fir),
            "gain" => Some(Self::Gain),
            "passthrough" | "thru" => Some(Self::Passthrough),
            _ => None,
        }
    }

    /// Canonical kind name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Spectrum => "spectrum",
            Self::Fir => "fir",
            Self::Gain => "gain",
            Self::Passthrough => "passthrough",
        }
    }

    /// One-line description for listings.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Input => "routing point without an own stage",
            Self::Spectrum => "log-frequency spectrum analyser",
            Self::Fir => "unit-gain FIR delay line",
            Self::Gain => "constant gain",
            Self::Passthrough => "unchanged copy",
        }
    }

    /// Parameter names this kind understands.
    pub const fn params(self) -> &'static [&'static str] {
        match self {
            Self::Spectrum => &[
                "size",
                "low",
                "high",
                "width",
                "height",
                "points_per_pixel",
                "smoothing",
                "fps",
                "window",
            ],
            Self::Fir => &["kernel"],
            Self::Gain => &["gain"],
            Self::Input | Self::Passthrough => &[],
        }
    }

    /// Returns true if stages of this kind install an own stage.
    pub const fn has_own_stage(self) -> bool {
        !matches!(self, Self::Input)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
