pub mod archive;
pub mod batch;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod planner;
pub mod serialization;
pub mod series;

mod helpers;
mod traits;

pub use archive::{BatchKind, pack, pack_named, write_entries};
pub use batch::{DecrementJob, SubstitutionJob, run_decrement, run_substitution};
pub use extract::{extract, extract_indexed, normalize_timestamp, parse_timestamp};
pub use loader::{load_source, load_table};
pub use merge::{group_key, merge_sources};
pub use planner::{ExtractionConfigEntry, parse_config};
pub use series::{ChartSpec, ChartStyle, RenderedChart, TimeWindow, filter_window, render_chart};
pub use traits::{BatchGenerator, BatchPackager};
