mod file;

pub use file::{VideoError, VideoFileSource};
