// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup
// - infrastructure: DB/identity/change-feed adapters
// - presentation: HTTP handlers and routing
// - application: ports, use cases, and the sync service
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
pub(crate) mod test_support;
