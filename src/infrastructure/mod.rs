pub mod cdp_driver;
pub mod driver;
pub mod js_executor;
pub mod kv_store;

pub use cdp_driver::CdpPageDriver;
pub use driver::{ElementRef, FetchResponse, PageDriver};
pub use js_executor::JsExecutor;
pub use kv_store::JsonFileStore;
