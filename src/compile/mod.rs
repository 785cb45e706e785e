pub mod compiler;
pub mod fingerprint;
pub mod plan;
