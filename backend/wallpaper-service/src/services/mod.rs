//! Service layer for image resolution
//!
//! - `feed`: upstream listing schema and entry selection
//! - `fetcher`: HTTP access to the feed and image hosts
//! - `transcoder`: optional shrink-to-JPEG stage
//! - `pipeline`: cache-aside orchestration of the above

pub mod feed;
pub mod fetcher;
pub mod pipeline;
pub mod transcoder;

pub use fetcher::{HttpSource, ImageSource};
pub use pipeline::{ResolutionPipeline, ResolvedImage};
pub use transcoder::{JpegShrinker, PassThrough, Transcoder};
