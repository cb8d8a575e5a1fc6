// Adapters layer: concrete implementations of the domain ports.
// The Mailchimp HTTP adapter lives in core::client next to the wire helpers.

pub mod local_storage;

pub use local_storage::LocalStorage;
