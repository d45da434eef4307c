// Copyright 2025 Cowboy AI, LLC.

//! Workflow module: definitions, instances, and the permission-resolution kernel
//!
//! - Definitions are graphs of actions joined by optionally permission-gated
//!   transitions
//! - Instances carry an append-only history of executed actions
//! - Resolvers and authorizers answer who may see an instance and which
//!   transitions they may take
//! - The engine fires transitions after re-validating them

pub mod authorization;
pub mod definition;
pub mod engine;
pub mod events;
pub mod history;
pub mod instance;
pub mod transitions;

pub use authorization::*;
pub use definition::*;
pub use engine::*;
pub use events::*;
pub use history::*;
pub use instance::*;
pub use transitions::*;
