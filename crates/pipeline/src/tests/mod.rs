//! Pipeline-level tests with scripted models and stub tools.

mod properties;
mod support;
