//! Open-time recovery: stale temp files and unflushed appended bodies.

pub mod tail_replay;
pub mod temp_files;

pub use tail_replay::{replay_tail, TailReplay};
pub use temp_files::{remove_stale_temp, temp_path};
