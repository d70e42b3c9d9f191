use super::preprocessor::PreprocessorChain;
use pulldown_cmark::{Options, Parser, html};

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Run the preprocessors, then render the result to HTML.
pub fn render_html(markdown: &str, chain: &PreprocessorChain) -> String {
    let source = chain.run_text(markdown);
    let parser = Parser::new_ext(&source, parser_options());

    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{BlankLineSettings, BlankRunTransformer};

    const SPACER: &str = r#"<div class="mkdocs-preserved-blank" style="height:2em;line-height:0;margin:0;padding:0"></div>"#;

    fn chain() -> PreprocessorChain {
        PreprocessorChain::with_blank_lines(BlankRunTransformer::default())
    }

    #[test]
    fn test_spacer_passes_through_as_raw_html() {
        let html = render_html("A\n\n\nB", &chain());
        assert!(html.contains("<p>A</p>"));
        assert!(html.contains(SPACER));
        assert!(html.contains("<p>B</p>"));
        assert!(!html.contains("&lt;div"));
    }

    #[test]
    fn test_plain_paragraphs_have_no_spacer() {
        let html = render_html("A\n\nB", &chain());
        assert!(!html.contains("mkdocs-preserved-blank"));
        assert!(html.contains("<p>A</p>"));
        assert!(html.contains("<p>B</p>"));
    }

    #[test]
    fn test_empty_chain_renders_markdown_only() {
        let html = render_html("# Title\n\n\n\ntext", &PreprocessorChain::new());
        assert!(html.contains("<h1>Title</h1>"));
        assert!(!html.contains("mkdocs-preserved-blank"));
    }

    #[test]
    fn test_spacer_between_headings_and_lists() {
        let settings = BlankLineSettings::new(10.0, "px", 50);
        let chain = PreprocessorChain::with_blank_lines(BlankRunTransformer::new(settings));
        let html = render_html("# Title\n\n\n\n- item", &chain);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("height:30px"));
        assert!(html.contains("<li>item</li>"));
    }
}
