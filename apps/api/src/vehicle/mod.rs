// Vehicle listing: field rules, registry and generation lookups, and the form controller.
// All generation calls go through llm_client; all registry calls through registry.

pub mod form;
pub mod handlers;
pub mod lookup;
pub mod models;
pub mod prompts;
pub mod registry;
pub mod schemas;
