use super::preserve::BlankRunTransformer;

/// A text stage run over a document's lines before block parsing.
pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &str;

    /// Higher priorities run first.
    fn priority(&self) -> i32;

    fn run(&self, lines: Vec<String>) -> Vec<String>;
}

pub const PRESERVE_BLANK_LINES: &str = "preserve_blank_lines";
pub const PRESERVE_BLANK_LINES_PRIORITY: i32 = 175;

impl Preprocessor for BlankRunTransformer {
    fn name(&self) -> &str {
        PRESERVE_BLANK_LINES
    }

    fn priority(&self) -> i32 {
        PRESERVE_BLANK_LINES_PRIORITY
    }

    fn run(&self, lines: Vec<String>) -> Vec<String> {
        self.transform_lines(&lines)
    }
}

/// Ordered set of preprocessors, keyed by name.
#[derive(Default)]
pub struct PreprocessorChain {
    stages: Vec<Box<dyn Preprocessor>>,
}

impl PreprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain holding only the blank-line transformer.
    pub fn with_blank_lines(transformer: BlankRunTransformer) -> Self {
        let mut chain = Self::new();
        chain.register(Box::new(transformer));
        chain
    }

    /// Add a stage. A stage with the same name is replaced.
    pub fn register(&mut self, stage: Box<dyn Preprocessor>) {
        self.deregister(stage.name());
        tracing::debug!(
            "Registering preprocessor {} (priority {})",
            stage.name(),
            stage.priority()
        );
        self.stages.push(stage);
        // Stable sort keeps registration order among equal priorities
        self.stages.sort_by_key(|s| std::cmp::Reverse(s.priority()));
    }

    pub fn deregister(&mut self, name: &str) -> bool {
        let before = self.stages.len();
        self.stages.retain(|s| s.name() != name);
        before != self.stages.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn run(&self, lines: Vec<String>) -> Vec<String> {
        self.stages
            .iter()
            .fold(lines, |lines, stage| stage.run(lines))
    }

    pub fn run_text(&self, text: &str) -> String {
        let lines = text.split('\n').map(String::from).collect();
        self.run(lines).join("\n")
    }
}
