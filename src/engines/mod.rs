pub mod detection;
pub mod mutation;
pub mod pipeline;
pub mod validation;
