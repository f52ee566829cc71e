// handlers/mod.rs - route handlers grouped by what they need from the request
//
// system:    no tenant context (/, /health)
// tenants:   registry lookups only, no connection is opened
// db:        run against the connection bound by the tenant binder, plus
//            eviction of cached connections
// sequences: code allocation through the bound connection

pub mod db;
pub mod sequences;
pub mod system;
pub mod tenants;
