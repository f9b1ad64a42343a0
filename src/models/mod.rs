pub mod mcq;
pub mod progress;
pub mod result;
pub mod submission;
