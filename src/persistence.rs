//! Driven adapters for the in-memory stores. Both stores live for as long as the process does
//! and are shared between requests behind a [std::sync::RwLock].

pub mod mem_code_driven_ports;
pub mod mem_todo_driven_ports;
