pub mod archive_job;
pub mod archive_result;
pub mod config;
pub mod move_status;
pub mod mq;
pub mod notification;
pub mod operation_type;
pub mod order_status;
pub mod photo_status;
pub mod retouch_status;
pub mod retry;
pub mod stats;
pub mod storage;
pub mod worker;

pub use move_status::MoveStatus;
pub use operation_type::OperationType;
pub use order_status::OrderStatus;
pub use photo_status::{PhotoStatus, SeniorPhotoStatus, ShootingRequestStatus};
pub use retouch_status::{RetouchRequestStatus, RetouchStatus, SeniorRetouchStatus};
