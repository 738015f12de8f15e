//! Periodic maintenance sweeps. Each runs on its own interval, is
//! idempotent, and tolerates individual row failures.

pub mod on_duty;
pub mod priority;
pub mod render_block;
pub mod shooting_check;
pub mod stats;

pub use on_duty::run_on_duty_reset;
pub use priority::run_priority_sweep;
pub use render_block::run_render_block_sweep;
pub use shooting_check::run_shooting_check_sweep;
pub use stats::run_daily_stats;
