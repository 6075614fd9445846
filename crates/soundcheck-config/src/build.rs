//! Turning a [`GraphConfig`] into a live [`RoutingGraph`].

use std::collections::HashMap;

use soundcheck_analysis::{
    AlwaysRender, EstimatorConfig, FrameRateGate, RenderGate, SpectrumConfig, SpectrumRenderer,
    SpectrumStage, SystemClock, TickDivider, Window,
};
use soundcheck_core::{
    BlockShape, DelayLine, FirKernel, Gain, GraphBuilder, Passthrough, RouteError, RoutingGraph,
    SampleBlock, Stage, StageId,
};

use crate::error::ConfigError;
use crate::graph_config::GraphConfig;
use crate::kind::StageKind;
use crate::stage_entry::StageEntry;
use crate::validation::validate_graph;

/// How spectrum stages decide when to rebuild their chart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GateMode {
    /// Wall-clock frame rate from each stage's `fps` parameter.
    #[default]
    WallClock,
    /// Rebuild on every tick.
    EveryTick,
    /// Rebuild on every n-th tick, starting with the first.
    EveryNth(u64),
}

impl GateMode {
    fn gate(self, fps: f64) -> Box<dyn RenderGate> {
        match self {
            GateMode::WallClock => Box::new(FrameRateGate::with_fps(SystemClock::new(), fps)),
            GateMode::EveryTick => Box::new(AlwaysRender),
            GateMode::EveryNth(n) => Box::new(TickDivider::new(n)),
        }
    }
}

/// Runtime collaborators handed to the built stages.
#[derive(Default)]
pub struct BuildOptions {
    gate: GateMode,
    renderers: HashMap<String, Box<dyn SpectrumRenderer>>,
}

impl BuildOptions {
    /// Options with a wall-clock gate and no renderers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the gate used by every spectrum stage.
    pub fn with_gate(mut self, gate: GateMode) -> Self {
        self.gate = gate;
        self
    }

    /// Attaches a renderer to the spectrum stage `id`.
    ///
    /// Spectrum stages without a renderer draw nothing.
    pub fn with_renderer(
        mut self,
        id: impl Into<String>,
        renderer: Box<dyn SpectrumRenderer>,
    ) -> Self {
        self.renderers.insert(id.into(), renderer);
        self
    }
}

/// A routing graph together with the settings it was built for.
pub struct BuiltGraph {
    /// The wired graph.
    pub graph: RoutingGraph,
    /// Node that receives source blocks.
    pub entry: StageId,
    /// Shape of every block.
    pub shape: BlockShape,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl BuiltGraph {
    /// Routes one block through the entry node.
    pub fn tick(&mut self, output: &mut SampleBlock, input: &SampleBlock) -> Result<(), RouteError> {
        self.graph.route(self.entry.as_str(), output, input)
    }

    /// Clears the state of every stage.
    pub fn reset(&mut self) {
        self.graph.reset();
    }

    /// Duration of one block in seconds.
    pub fn block_seconds(&self) -> f64 {
        self.shape.frames as f64 / f64::from(self.sample_rate.max(1))
    }
}

impl std::fmt::Debug for BuiltGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltGraph")
            .field("entry", &self.entry)
            .field("shape", &self.shape)
            .field("sample_rate", &self.sample_rate)
            .field("nodes", &self.graph.len())
            .finish_non_exhaustive()
    }
}

/// Validates `config` and builds its routing graph.
///
/// # Example
///
/// ```rust
/// use soundcheck_config::{build_graph, get_factory_layout, BuildOptions, GateMode};
/// use soundcheck_core::SampleBlock;
///
/// let layout = get_factory_layout("filtered").expect("factory layout");
/// let mut built = build_graph(&layout, BuildOptions::new().with_gate(GateMode::EveryTick))?;
/// let input = SampleBlock::new(built.shape);
/// let mut output = SampleBlock::new(built.shape);
/// built.tick(&mut output, &input)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build_graph(
    config: &GraphConfig,
    mut options: BuildOptions,
) -> Result<BuiltGraph, ConfigError> {
    validate_graph(config)?;

    let shape = config.block_shape();
    let mut builder = GraphBuilder::new().with_block_shape(shape);
    for entry in &config.stages {
        let kind = StageKind::from_name(&entry.kind)
            .ok_or_else(|| ConfigError::UnknownKind(entry.kind.clone()))?;
        builder.add_node(entry.id.as_str(), &entry.inserts.to_spec())?;
        if let Some(stage) = create_stage(entry, kind, config, &mut options)? {
            builder.set_own_stage(&entry.id, stage)?;
        }
    }

    tracing::debug!(
        name = %config.name,
        nodes = builder.len(),
        shape = %shape,
        entry = %config.entry,
        "graph built"
    );

    Ok(BuiltGraph {
        graph: builder.build(),
        entry: StageId::new(config.entry.as_str()),
        shape,
        sample_rate: config.sample_rate,
    })
}

/// Identifiers of every spectrum stage, in declaration order.
pub fn spectrum_stage_ids(config: &GraphConfig) -> Vec<&str> {
    config
        .stages
        .iter()
        .filter(|s| StageKind::from_name(&s.kind) == Some(StageKind::Spectrum))
        .map(|s| s.id.as_str())
        .collect()
}

fn create_stage(
    entry: &StageEntry,
    kind: StageKind,
    config: &GraphConfig,
    options: &mut BuildOptions,
) -> Result<Option<Box<dyn Stage + Send>>, ConfigError> {
    let stage: Box<dyn Stage + Send> = match kind {
        StageKind::Input => return Ok(None),
        StageKind::Passthrough => Box::new(Passthrough),
        StageKind::Gain => Box::new(Gain::new(gain_factor(entry)?)),
        StageKind::Fir => Box::new(DelayLine::new(fir_kernel(entry)?, config.channels)),
        StageKind::Spectrum => {
            let settings = spectrum_config(entry, config)?;
            let mut stage = SpectrumStage::new(settings)
                .map_err(|source| ConfigError::Spectrum {
                    stage: entry.id.clone(),
                    source,
                })?
                .with_gate(options.gate.gate(settings.fps));
            if let Some(renderer) = options.renderers.remove(&entry.id) {
                stage = stage.with_renderer(renderer);
            }
            Box::new(stage)
        }
    };
    Ok(Some(stage))
}

/// Checks a stage's parameter values without building it.
pub(crate) fn check_params(
    entry: &StageEntry,
    kind: StageKind,
    config: &GraphConfig,
) -> Result<(), ConfigError> {
    match kind {
        StageKind::Input | StageKind::Passthrough => Ok(()),
        StageKind::Gain => gain_factor(entry).map(drop),
        StageKind::Fir => fir_kernel(entry).map(drop),
        StageKind::Spectrum => {
            spectrum_config(entry, config)?
                .validate()
                .map_err(|source| ConfigError::Spectrum {
                    stage: entry.id.clone(),
                    source,
                })
        }
    }
}

/// Reads the settings of a spectrum stage, falling back to defaults.
pub fn spectrum_config(
    entry: &StageEntry,
    config: &GraphConfig,
) -> Result<SpectrumConfig, ConfigError> {
    let defaults = SpectrumConfig::default();
    let window = match entry.get_param("window") {
        None => defaults.estimator.window,
        Some(name) => Window::from_name(name.trim()).ok_or_else(|| {
            ConfigError::invalid_param(&entry.id, "window", format!("unknown window '{name}'"))
        })?,
    };

    Ok(SpectrumConfig {
        estimator: EstimatorConfig {
            size: count_param(entry, "size", defaults.estimator.size)?,
            sample_rate: f64::from(config.sample_rate),
            low_hz: number_param(entry, "low", defaults.estimator.low_hz)?,
            high_hz: number_param(entry, "high", defaults.estimator.high_hz)?,
            smoothing: number_param(entry, "smoothing", defaults.estimator.smoothing)?,
            window,
        },
        width: count_param(entry, "width", defaults.width)?,
        height: count_param(entry, "height", defaults.height)?,
        points_per_pixel: count_param(entry, "points_per_pixel", defaults.points_per_pixel)?,
        fps: number_param(entry, "fps", defaults.fps)?,
    })
}

fn fir_kernel(entry: &StageEntry) -> Result<FirKernel, ConfigError> {
    match entry.get_param("kernel") {
        None => Ok(FirKernel::default()),
        Some(name) => FirKernel::from_name(&name.trim().to_ascii_lowercase()).ok_or_else(|| {
            ConfigError::invalid_param(
                &entry.id,
                "kernel",
                format!("unknown kernel '{name}' (expected average3 or comb3)"),
            )
        }),
    }
}

fn gain_factor(entry: &StageEntry) -> Result<f64, ConfigError> {
    number_param(entry, "gain", 1.0)
}

fn number_param(entry: &StageEntry, param: &str, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = entry.get_param(param) else {
        return Ok(default);
    };
    match entry.parse_param(param) {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ConfigError::invalid_param(
            &entry.id,
            param,
            format!("'{raw}' is not a number"),
        )),
    }
}

fn count_param(entry: &StageEntry, param: &str, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = entry.get_param(param) else {
        return Ok(default);
    };
    raw.trim().parse::<usize>().map_err(|_| {
        ConfigError::invalid_param(
            &entry.id,
            param,
            format!("'{raw}' is not a non-negative integer"),
        )
    })
}
