pub mod fields;
pub mod genon;
pub mod note;
pub mod output;
pub mod pitch;
pub mod sketch;
pub mod synth;
pub mod tone;
