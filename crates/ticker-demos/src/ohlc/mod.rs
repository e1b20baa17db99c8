//! Stock ticker: a short series of OHLC bars drawn as a line list.

mod glyph;

pub use glyph::{
    glyph_vertices, Bar, ChartArea, LineVertex, DOWN_COLOR, UP_COLOR, VERTICES_PER_BAR,
};

use anyhow::{Context, Result};
use ticker_engine::core::{App, AppControl, FrameCtx};
use ticker_engine::gfx::{
    Backend, BackendKind, Bindings, BufferDesc, PassAction, PipelineDesc, PipelineHandle,
    PrimitiveType, ShaderDesc, VertexFormat, VertexLayout,
};
use ticker_engine::window::AppDesc;

pub const TITLE: &str = "Stock Ticker";

/// Two weeks of a made-up ticker.
pub const SAMPLE_BARS: [Bar; 10] = [
    Bar::new(101.2, 103.8, 100.4, 103.1),
    Bar::new(103.1, 104.0, 101.7, 102.2),
    Bar::new(102.2, 102.9, 99.8, 100.3),
    Bar::new(100.3, 101.5, 98.6, 101.1),
    Bar::new(101.1, 105.2, 100.9, 104.7),
    Bar::new(104.7, 106.3, 103.9, 105.8),
    Bar::new(105.8, 106.1, 102.4, 103.0),
    Bar::new(103.0, 104.4, 102.1, 104.4),
    Bar::new(104.4, 107.5, 104.0, 107.1),
    Bar::new(107.1, 107.9, 105.3, 105.9),
];

pub fn app_desc() -> AppDesc {
    AppDesc::new(TITLE)
}

pub fn shader_desc(_kind: BackendKind) -> ShaderDesc<'static> {
    ShaderDesc::wgsl("ohlc shader", include_str!("../shaders/ohlc.wgsl"))
}

pub struct Ohlc {
    pipeline: PipelineHandle,
    bindings: Bindings,
    vertex_count: u32,
    pass_action: PassAction,
}

impl Ohlc {
    pub fn init(gfx: &mut dyn Backend) -> Result<Self> {
        Self::with_bars(gfx, &SAMPLE_BARS)
    }

    pub fn with_bars(gfx: &mut dyn Backend, bars: &[Bar]) -> Result<Self> {
        let vertices = glyph_vertices(bars, &ChartArea::default()).context("ohlc geometry")?;

        let vbuf = gfx
            .create_buffer(&BufferDesc::vertices("ohlc_vertices", &vertices))
            .context("ohlc vertex buffer")?;

        let shader = gfx
            .create_shader(&shader_desc(gfx.backend_kind()))
            .context("ohlc shader")?;

        let layout = VertexLayout::interleaved(&[VertexFormat::Float2, VertexFormat::Float3]);
        let pipeline = gfx
            .create_pipeline(
                &PipelineDesc::new("ohlc_pipeline", shader, layout).primitive(PrimitiveType::Lines),
            )
            .context("ohlc pipeline")?;

        log::debug!("ohlc: {} bars, {} vertices", bars.len(), vertices.len());

        Ok(Self {
            pipeline,
            bindings: Bindings::new().vertex(0, vbuf),
            vertex_count: u32::try_from(vertices.len()).context("too many bars")?,
            pass_action: PassAction::default(),
        })
    }
}

impl App for Ohlc {
    fn frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let gfx = &mut *ctx.gfx;
        gfx.begin_pass(&self.pass_action);
        gfx.apply_pipeline(self.pipeline);
        gfx.apply_bindings(&self.bindings);
        gfx.draw(0, self.vertex_count, 1);
        gfx.end_pass();
        gfx.commit();
        AppControl::Continue
    }
}
