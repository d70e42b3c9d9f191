pub mod options;
pub mod preprocessor;
pub mod preserve;
pub mod render;

pub use options::{BlankLineOptions, BlankLineSettings};
pub use preprocessor::{Preprocessor, PreprocessorChain};
pub use preserve::{BlankRunTransformer, SPACER_CLASS, preserve_blank_lines};
pub use render::render_html;
