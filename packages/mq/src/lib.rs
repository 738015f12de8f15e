//! Queue glue over broccoli_queue, shared by the API server (publish,
//! result consumption) and the worker (task consumption).

pub mod config;
pub mod error;
pub mod models;

pub use config::ConsumeConfig;
pub use models::{BrokerMessage, BroccoliError, MqBuilder, MqConfig, MqQueue, init_mq};

pub type Mq = MqQueue;
