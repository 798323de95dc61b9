/// Router Module Index
///
/// Splits the portal's routes into the JSON surface every client may call and the
/// page routes generated from the page registry. Page routes carry their own gate,
/// so no router-level auth layer is needed.

/// Health check and the introspection API (pages, decisions, session).
pub mod public;

/// One GET route per registered page, each guarded by the page's gate.
pub mod pages;
