pub mod samples;

pub use samples::load_samples;
