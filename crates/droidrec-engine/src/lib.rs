pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod formatter;
pub mod keys;
pub mod normalizer;
pub mod pipeline;
pub mod recorder;
pub mod store;
pub mod tokenizer;
pub mod touch;
pub mod uitree;

pub use droidrec_common::error;
pub use droidrec_common::protocol;
