// Comment moderation library.
//
// **Architecture Overview:**
// - `core/` = Policy logic and the traits it needs (no HTTP, no storage)
// - `infra/` = Implementations of core traits (Akismet, configured site, records)

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;
