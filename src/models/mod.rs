pub mod ids;
pub mod loaders;
pub mod site_profile;
pub mod step;

pub use ids::{ItemCode, TenantId};
pub use loaders::{load_order_list, load_site_profile_or_builtin};
pub use site_profile::{HubLayout, OrderEntryLayout, PrintLayout, Recipe, SiteProfile};
pub use step::{Locator, RecipeStep, Step, StepResult};
