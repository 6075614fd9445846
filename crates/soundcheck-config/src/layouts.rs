//! Factory layouts bundled with the library.
//!
//! These graphs are always available without external files. `soundcheck`
//! is the plain analyser, `filtered` puts a FIR in front of it and `bare`
//! routes blocks through untouched.

use crate::graph_config::GraphConfig;

/// Names of the factory layouts, in listing order.
pub static FACTORY_LAYOUT_NAMES: &[&str] = &["soundcheck", "filtered", "bare"];

static FACTORY_LAYOUTS_TOML: &[(&str, &str)] = &[
    ("soundcheck", SOUNDCHECK_LAYOUT),
    ("filtered", FILTERED_LAYOUT),
    ("bare", BARE_LAYOUT),
];

/// Input node with a spectrum analyser in its post-chain.
const SOUNDCHECK_LAYOUT: &str = r#"
name = "soundcheck"
description = "Spectrum of the input, 4096-point transform, 10 Hz to 20 kHz"
sample_rate = 44100
block_size = 1024
channels = 1
entry = "input"

[[stages]]
id = "fft"
kind = "spectrum"
[stages.params]
size = "4096"
low = "10Hz"
high = "20kHz"
smoothing = "0.4"
fps = "60"

[[stages]]
id = "input"
kind = "input"
[stages.inserts]
post = ["fft"]
"#;

/// Three-tap average before the analyser.
const FILTERED_LAYOUT: &str = r#"
name = "filtered"
description = "Three-tap moving average ahead of the spectrum analyser"
sample_rate = 44100
block_size = 1024
channels = 1
entry = "input"

[[stages]]
id = "fft"
kind = "spectrum"
[stages.params]
size = "4096"

[[stages]]
id = "fir"
kind = "fir"
[stages.params]
kernel = "average3"

[[stages]]
id = "input"
kind = "input"
[stages.inserts]
pre = ["fir"]
post = ["fft"]
"#;

/// Input node only.
const BARE_LAYOUT: &str = r#"
name = "bare"
description = "Blocks pass through unchanged"
sample_rate = 44100
block_size = 1024
channels = 1
entry = "input"

[[stages]]
id = "input"
kind = "input"
"#;

/// All factory layouts, in listing order.
pub fn factory_layouts() -> Vec<GraphConfig> {
    FACTORY_LAYOUTS_TOML
        .iter()
        .filter_map(|(_, toml)| GraphConfig::from_toml(toml).ok())
        .collect()
}

/// Get a factory layout by name (case-insensitive).
///
/// ```rust
/// use soundcheck_config::get_factory_layout;
///
/// let layout = get_factory_layout("Filtered").expect("bundled");
/// assert_eq!(layout.stage_ids(), vec!["fft", "fir", "input"]);
/// ```
pub fn get_factory_layout(name: &str) -> Option<GraphConfig> {
    let name = name.to_lowercase();
    FACTORY_LAYOUTS_TOML
        .iter()
        .find(|(layout, _)| *layout == name)
        .and_then(|(_, toml)| GraphConfig::from_toml(toml).ok())
}

/// Returns true if `name` is a factory layout (case-insensitive).
pub fn is_factory_layout(name: &str) -> bool {
    let name = name.to_lowercase();
    FACTORY_LAYOUT_NAMES.iter().any(|layout| *layout == name)
}
