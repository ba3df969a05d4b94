pub mod flood;
pub mod morphology;
