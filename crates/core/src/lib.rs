pub mod block_assembler;
pub mod constants;
pub mod detector;
pub mod input;
pub mod pipeline;
pub mod settings;
pub mod shared;
pub mod spectrum;
pub mod timer;
pub mod view;

pub use block_assembler::BlockAssembler;
pub use pipeline::AnalysisPipeline;
pub use settings::{SettingId, Settings};
pub use shared::SharedState;
pub use spectrum::{BandLayout, ScalingMode, SpectrumAnalyzer};
pub use timer::SessionTimer;
pub use view::{View, ViewController};
