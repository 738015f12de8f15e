pub mod archive_result;

pub use archive_result::consume_archive_results;
