pub mod config;
pub mod contracts;
pub mod db;
pub mod redis_bus;

pub use config::ServiceConfig;
pub use contracts::{
    AdvanceStatusRequest, CompleteSaleRequest, ForecastQuery, RecordsQuery, RemovedResponse,
    SalaryPaymentRequest, StaffPaymentRequest, SupplierPaymentRequest, UpsertRecordRequest,
};
pub use db::{build_record_store, connect_database};
pub use redis_bus::{RECORDS_CHANGED_CHANNEL, RedisBus, apply_change};
