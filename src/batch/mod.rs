//! 批量对比模块。
//!
//! - `range`：日期区间、对比区间与子区间拆分
//! - `dispatcher`：受并发上限与截止时间约束的并发分发
//! - `aggregator`：合计、环比与执行元数据
//! - `contract`：对外 JSON 结构
//! - `service`：把以上步骤串起来

pub mod aggregator;
pub mod contract;
pub mod dispatcher;
pub mod range;
pub mod service;
pub mod types;

pub use contract::{ContractResponse, ContractStatus};
pub use dispatcher::BatchDispatcher;
pub use range::{DateRange, PeriodKind, RangeError};
pub use service::BatchService;
pub use types::{BatchMetadata, BatchResult, PeriodResult, SubRangeRequest, SubRangeResult};
