#![forbid(unsafe_code)]

pub mod artifacts;
pub mod chapters;
pub mod cli;
pub mod convert;
pub mod document;
pub mod enrich;
pub mod error;
pub mod formats;
pub mod heading;
pub mod logging;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod registry;
pub mod sections;
pub mod slug;
pub mod split;
pub mod sql;
pub mod workspace;
