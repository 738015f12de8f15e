pub mod archive;
pub mod notify;
pub mod stats;
