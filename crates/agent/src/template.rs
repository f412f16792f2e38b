// Prompt templates with named `{placeholder}` substitution

use crate::error::TemplateRenderError;
use std::collections::{BTreeMap, BTreeSet};

/// Named values substituted into prompt templates
pub type PromptValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed prompt template.
///
/// Placeholders are written `{name}`. Literal braces are escaped by doubling
/// them (`{{` and `}}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template, rejecting unbalanced braces and empty placeholders
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateRenderError> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateRenderError::UnbalancedBrace(pos)),
                            c => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(TemplateRenderError::UnbalancedBrace(pos));
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(TemplateRenderError::EmptyPlaceholder(pos));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(TemplateRenderError::UnbalancedBrace(pos)),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { source, segments })
    }

    /// The raw, unrendered template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of every placeholder the template declares
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    /// Substitute `values` into the template.
    ///
    /// Every declared placeholder must have a value. Values the template does
    /// not use are ignored here; the agent checks them across both templates.
    pub fn render(&self, values: &PromptValues) -> Result<String, TemplateRenderError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| TemplateRenderError::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> PromptValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let template = PromptTemplate::parse("Komentar tentang {topic} untuk {audience}.").unwrap();
        let rendered = template
            .render(&values(&[("topic", "kebakaran"), ("audience", "semua")]))
            .unwrap();
        assert_eq!(rendered, "Komentar tentang kebakaran untuk semua.");
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_no_placeholders_returns_template_unchanged() {
        let template = PromptTemplate::parse("You are a prompt engineer.").unwrap();
        assert!(!template.has_placeholders());
        let rendered = template.render(&values(&[("unused", "x")])).unwrap();
        assert_eq!(rendered, "You are a prompt engineer.");
    }

    #[test]
    fn test_missing_value_fails() {
        let template = PromptTemplate::parse("Here is the prompt:\n{data_input}\n").unwrap();
        let err = template.render(&PromptValues::new()).unwrap_err();
        assert_eq!(err, TemplateRenderError::MissingValue("data_input".into()));
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::parse(r#"Reply as {{"response": "{kind}"}}"#).unwrap();
        assert_eq!(template.placeholders().into_iter().collect::<Vec<_>>(), vec!["kind"]);
        let rendered = template.render(&values(&[("kind", "text")])).unwrap();
        assert_eq!(rendered, r#"Reply as {"response": "text"}"#);
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert_eq!(
            PromptTemplate::parse("open {name").unwrap_err(),
            TemplateRenderError::UnbalancedBrace(5)
        );
        assert_eq!(
            PromptTemplate::parse("close }").unwrap_err(),
            TemplateRenderError::UnbalancedBrace(6)
        );
        assert_eq!(
            PromptTemplate::parse("empty {}").unwrap_err(),
            TemplateRenderError::EmptyPlaceholder(6)
        );
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = PromptTemplate::parse("{x} and {x}").unwrap();
        assert_eq!(template.placeholders().len(), 1);
        assert_eq!(template.render(&values(&[("x", "y")])).unwrap(), "y and y");
    }
}
