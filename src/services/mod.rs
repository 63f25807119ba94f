pub mod completion_ledger;
pub mod element_locator;
pub mod exporter;
pub mod hub_table;
pub mod item_code;
pub mod readiness_gate;
pub mod step_executor;
pub mod tenant_resolver;
pub mod unmarked_finder;

pub use completion_ledger::{AddOutcome, CompletionLedger, LEDGER_KEY};
pub use exporter::{export_filename, Exporter, ScreenshotExporter};
pub use item_code::ItemCodePattern;
pub use readiness_gate::{Readiness, ReadinessGate, ReadinessState};
pub use step_executor::{StepExecutor, StepTarget};
pub use tenant_resolver::{TenantResolver, TenantSlot};
pub use unmarked_finder::{find_first_unmarked, UnmarkedItem};
