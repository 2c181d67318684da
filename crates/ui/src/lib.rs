pub mod framebuffer;
pub mod render;
pub mod visualizer;
pub mod widgets;

pub use framebuffer::{Display, FrameBuffer};
pub use render::{RenderInput, Renderer};
