pub mod guard;
pub mod order_entry;
pub mod page_ctx;
pub mod page_state;
pub mod router;

pub use guard::{RunGuard, RunPermit};
pub use order_entry::{OrderEntryFlow, OrderOutcome};
pub use page_ctx::{PageContext, PageDeps};
pub use page_state::PageState;
pub use router::{run_page, RecipeReport};
