pub mod toml_loader;

pub use toml_loader::{
    load_order_list, load_site_profile, load_site_profile_or_builtin, parse_order_list,
    parse_site_profile,
};
