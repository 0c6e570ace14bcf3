//! Talos Store
//!
//! Storage adapters implementing the [`talos_ports::RobotStore`] port.
//! A relational adapter lives outside this workspace; the in-memory store
//! here backs the runner and the engine's tests.

mod in_memory;

pub use in_memory::InMemoryRobotStore;
