pub mod actuator;
pub mod classifier;
pub mod oracle;
pub mod sampler;
