//! Concurrency-safe building blocks shared by the transport core and
//! concrete backends.

pub mod callbacks;
pub mod cyclic_queue;
pub mod safe_map;
