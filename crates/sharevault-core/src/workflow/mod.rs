//! 工作流模块
//!
//! 传输控制器持有表单状态，并编排上传和下载两个流程

pub mod controller;
pub mod state;

pub use controller::{TransferController, TransferEvent};
pub use state::TransferState;
