pub mod accumulator;
pub mod centroiding;
pub mod chromatogram;
pub mod errors;
pub mod options;
pub mod ranker;
pub mod render;
pub mod scan;
pub mod series;
pub mod utils;

#[doc(inline)]
pub use accumulator::{
    AccumulatorStats,
    MAX_ALLOWABLE_ION_COUNT,
    NoticeCounters,
    ScanAccumulator,
    TrimSummary,
};
#[doc(inline)]
pub use centroiding::{
    CentroidSummary,
    Centroider,
    needs_centroiding,
};
#[doc(inline)]
pub use chromatogram::{
    ChromatogramAccumulator,
    ChromatogramKind,
    ChromatogramPoint,
};
#[doc(inline)]
pub use errors::{
    AddScanOutcome,
    LcmsPlotError,
    Result,
};
#[doc(inline)]
pub use options::FilterOptions;
#[doc(inline)]
pub use ranker::{
    IonFilterRanker,
    RankerConfig,
};
#[doc(inline)]
pub use render::{
    ImageFormat,
    PlotRenderer,
    plot_file_path,
    save_plot,
};
#[doc(inline)]
pub use scan::{
    Ion,
    MsLevelFilter,
    ScanRecord,
};
#[doc(inline)]
pub use series::{
    AxisRange,
    ColorScale,
    Palette,
    PlotData,
    PlotPoint,
    PlotSeries,
    Rgb,
    SeriesBuilder,
    SeriesKind,
    charge_color,
};
