pub mod synth;

pub use crate::synth::{DetailLevel, GraphOptions, synthesize};
