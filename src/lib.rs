//! Keeps intentional vertical whitespace in Markdown.
//!
//! Markdown renderers collapse any number of blank lines into a single
//! paragraph break. This crate rewrites runs of three or more line breaks
//! into sized `<div class="mkdocs-preserved-blank">` spacers before the
//! document reaches the renderer.
//!
//! ```
//! use preserve_blank_lines::{BlankLineSettings, BlankRunTransformer};
//!
//! let transformer = BlankRunTransformer::new(BlankLineSettings::default());
//! let out = transformer.transform("A\n\n\nB");
//! assert!(out.contains("height:2em"));
//! ```

pub mod batch;
pub mod config;
pub mod markdown;
pub mod mkdocs;

pub use batch::{BatchOptions, BatchReport, process_tree};
pub use config::{Config, ConfigSources};
pub use markdown::{
    BlankLineOptions, BlankLineSettings, BlankRunTransformer, Preprocessor, PreprocessorChain,
    preserve_blank_lines, render_html,
};
