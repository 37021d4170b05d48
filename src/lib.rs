// Module layout (Clean Architecture style)
// - bootstrap: configuration and wiring
// - infrastructure: Postgres, redis and in-memory adapters
// - presentation: HTTP handlers and routing
// - application: ports, engines and use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
