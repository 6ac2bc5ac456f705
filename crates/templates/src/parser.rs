//! Template text parser.
//!
//! Grammar (informal):
//! ```text
//! template := (text | variable | partial | helper)*
//! text     := one or more characters other than '{' and '}'
//! variable := "{{" IDENT "}}"
//! partial  := "{{>" IDENT (variable | text)* "}}"
//! helper   := "{{#" IDENT (variable | text)* "}}"
//! IDENT    := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! Whitespace between tokens inside `{{ }}` is insignificant; text outside
//! tags is kept byte-for-byte. There is no escape for literal braces, so a
//! lone `{` or `}` is a syntax error.

use crate::TemplateError;

/// A parsed template: nodes in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseTree {
    pub nodes: Vec<Node>,
}

/// One element of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted unchanged.
    Text(String),
    /// `{{name}}`
    Variable(String),
    /// `{{>name args}}`
    Partial { name: String, args: Vec<Arg> },
    /// `{{#name args}}`
    Helper { name: String, args: Vec<Arg> },
}

/// A raw argument of a partial or helper tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Variable(String),
}

/// Parse template text into a [`ParseTree`].
pub fn parse(source: &str) -> Result<ParseTree, TemplateError> {
    let mut parser = Parser {
        source,
        chars: source.chars().collect(),
        pos: 0,
    };
    let mut nodes = Vec::new();

    while let Some(c) = parser.peek() {
        match c {
            '{' if parser.peek_at(1) == Some('{') => nodes.push(parser.tag()?),
            '{' | '}' => return Err(parser.unexpected(parser.pos)),
            _ => nodes.push(Node::Text(parser.text())),
        }
    }

    Ok(ParseTree { nodes })
}

#[derive(Clone, Copy)]
enum TagKind {
    Variable,
    Partial,
    Helper,
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consume characters up to the next brace.
    fn text(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '{' && c != '}') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Parse a tag starting at `{{`.
    fn tag(&mut self) -> Result<Node, TemplateError> {
        self.pos += 2;
        self.skip_whitespace();

        let kind = match self.peek() {
            Some('>') => {
                self.pos += 1;
                TagKind::Partial
            }
            Some('#') => {
                self.pos += 1;
                TagKind::Helper
            }
            _ => TagKind::Variable,
        };

        self.skip_whitespace();
        let name = self.ident()?;

        match kind {
            TagKind::Variable => {
                self.skip_whitespace();
                self.close()?;
                Ok(Node::Variable(name))
            }
            TagKind::Partial => Ok(Node::Partial {
                name,
                args: self.args()?,
            }),
            TagKind::Helper => Ok(Node::Helper {
                name,
                args: self.args()?,
            }),
        }
    }

    fn ident(&mut self) -> Result<String, TemplateError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.pos += 1,
            Some(_) => return Err(self.unexpected(self.pos)),
            None => return Err(self.end_of_input("an identifier")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// Expect the closing `}}`.
    fn close(&mut self) -> Result<(), TemplateError> {
        match (self.peek(), self.peek_at(1)) {
            (Some('}'), Some('}')) => {
                self.pos += 2;
                Ok(())
            }
            (Some('}'), None) | (None, _) => Err(self.end_of_input("'}}'")),
            (Some('}'), Some(_)) => Err(self.unexpected(self.pos + 1)),
            (Some(_), _) => Err(self.unexpected(self.pos)),
        }
    }

    /// Arguments of a partial or helper, up to and including the closing `}}`.
    fn args(&mut self) -> Result<Vec<Arg>, TemplateError> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.end_of_input("'}}'")),
                Some('}') => {
                    self.close()?;
                    return Ok(args);
                }
                Some('{') => {
                    if self.peek_at(1) != Some('{') {
                        return Err(self.unexpected(self.pos));
                    }
                    self.pos += 2;
                    self.skip_whitespace();
                    let name = self.ident()?;
                    self.skip_whitespace();
                    self.close()?;
                    args.push(Arg::Variable(name));
                }
                Some(_) => args.push(Arg::Text(self.text())),
            }
        }
    }

    /// Line and column (both 1-based) of a character offset.
    fn location(&self, pos: usize) -> (usize, usize) {
        let mut line = 1;
        let mut column = 1;
        for &c in &self.chars[..pos.min(self.chars.len())] {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (line, column)
    }

    /// The offending source line with a caret under `column`.
    fn excerpt(&self, line: usize, column: usize) -> String {
        let text = self.source.lines().nth(line - 1).unwrap_or("");
        format!("{text}\n{}^", " ".repeat(column - 1))
    }

    fn unexpected(&self, pos: usize) -> TemplateError {
        let c = self.chars.get(pos).copied().unwrap_or(' ');
        let (line, column) = self.location(pos);
        TemplateError::Syntax {
            message: format!("No terminal matches '{c}' in the current parser context"),
            line,
            column,
            excerpt: self.excerpt(line, column),
        }
    }

    fn end_of_input(&self, expected: &str) -> TemplateError {
        let (line, column) = self.location(self.chars.len());
        TemplateError::Syntax {
            message: format!("Unexpected end of template, expected {expected}"),
            line,
            column,
            excerpt: self.excerpt(line, column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.into())
    }

    #[test]
    fn plain_text_is_one_node() {
        let tree = parse("Just some text.\nWith lines.").unwrap();
        assert_eq!(tree.nodes, vec![text("Just some text.\nWith lines.")]);
    }

    #[test]
    fn empty_template() {
        assert!(parse("").unwrap().nodes.is_empty());
    }

    #[test]
    fn variable_between_text() {
        let tree = parse("I am {{name}}, what is your name?\n").unwrap();
        assert_eq!(
            tree.nodes,
            vec![
                text("I am "),
                Node::Variable("name".into()),
                text(", what is your name?\n"),
            ]
        );
    }

    #[test]
    fn whitespace_inside_tags_is_ignored() {
        let tree = parse("{{  name }}").unwrap();
        assert_eq!(tree.nodes, vec![Node::Variable("name".into())]);

        let tree = parse("{{ #upper input }}").unwrap();
        assert_eq!(
            tree.nodes,
            vec![Node::Helper {
                name: "upper".into(),
                args: vec![Arg::Text(" input ".into())],
            }]
        );
    }

    #[test]
    fn helper_with_text_args() {
        let tree = parse("{{#add input name}}\n").unwrap();
        assert_eq!(
            tree.nodes,
            vec![
                Node::Helper {
                    name: "add".into(),
                    args: vec![Arg::Text(" input name".into())],
                },
                text("\n"),
            ]
        );
    }

    #[test]
    fn helper_without_args() {
        let tree = parse("{{#now}}").unwrap();
        assert_eq!(
            tree.nodes,
            vec![Node::Helper {
                name: "now".into(),
                args: vec![],
            }]
        );
    }

    #[test]
    fn partial_with_mixed_args() {
        let tree = parse("{{>signature {{who}}, role}}").unwrap();
        assert_eq!(
            tree.nodes,
            vec![Node::Partial {
                name: "signature".into(),
                args: vec![
                    Arg::Text(" ".into()),
                    Arg::Variable("who".into()),
                    Arg::Text(", role".into()),
                ],
            }]
        );
    }

    #[test]
    fn lone_close_brace_is_an_error() {
        let err = parse("Hello } world").unwrap_err();
        match err {
            TemplateError::Syntax {
                message,
                line,
                column,
                excerpt,
            } => {
                assert!(message.starts_with("No terminal matches '}'"));
                assert_eq!((line, column), (1, 7));
                assert_eq!(excerpt, "Hello } world\n      ^");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn lone_open_brace_is_an_error() {
        let err = parse("a {b").unwrap_err();
        assert!(err.to_string().starts_with("No terminal matches '{'"));
    }

    #[test]
    fn error_location_counts_lines() {
        let err = parse("line one\nline {two").unwrap_err();
        match err {
            TemplateError::Syntax { line, column, .. } => assert_eq!((line, column), (2, 6)),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        let err = parse("Hi {{name").unwrap_err();
        assert!(err.to_string().starts_with("Unexpected end of template"));

        let err = parse("{{#upper input").unwrap_err();
        assert!(err.to_string().starts_with("Unexpected end of template"));
    }

    #[test]
    fn missing_identifier_is_an_error() {
        let err = parse("{{}}").unwrap_err();
        assert!(err.to_string().starts_with("No terminal matches '}'"));

        let err = parse("{{#9lives}}").unwrap_err();
        assert!(err.to_string().starts_with("No terminal matches '9'"));
    }

    #[test]
    fn extra_tokens_in_variable_are_an_error() {
        let err = parse("{{first last}}").unwrap_err();
        assert!(err.to_string().starts_with("No terminal matches 'l'"));
    }

    #[test]
    fn single_brace_inside_args_is_an_error() {
        let err = parse("{{#upper a}b}}").unwrap_err();
        assert!(err.to_string().starts_with("No terminal matches 'b'"));
    }
}
