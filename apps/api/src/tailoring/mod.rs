// Tailoring core: project selection, the length-adjustment controller and its
// rewrite capabilities, emphasis, assembly, and the per-user session store.
// The controller is the only place that mutates a SelectionState.

pub mod assembler;
pub mod controller;
pub mod emphasis;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod selection;
pub mod selector;
pub mod session;
pub mod shortener;
pub mod summary;
