//! Input containers shared by the optimizer and the pipeline.

mod observation;
mod pose;
mod target;

pub use observation::*;
pub use pose::*;
pub use target::*;
