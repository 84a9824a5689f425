//! Template source parsing.
//!
//! Turns one page, view, layout or component file into a small AST of
//! literal text, value interpolations and named block placeholders, plus the
//! named `define` bodies and the optional leading layout directive.
//!
//! ```text
//! <!--layout:main-->
//! {{ define "content" }}<div>{{ .title }}</div>{{ end }}
//! ```

use std::collections::HashMap;

use crate::error::ViewError;

const ACTION_OPEN: &str = "{{";
const ACTION_CLOSE: &str = "}}";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const LAYOUT_KEY: &str = "layout:";

/// One node of a parsed template body.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// `{{ . }}` or `{{ .a.b }}`; an empty path is the data root.
    Value(Vec<String>),
    /// `{{ block "name" . }}default{{ end }}`
    Block { name: String, default: Vec<Node> },
}

/// A parsed template file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    /// Layout named by the leading directive, if any.
    pub layout: Option<String>,
    /// Top-level nodes outside any `define`.
    pub body: Vec<Node>,
    /// Named `define` bodies.
    pub defines: HashMap<String, Vec<Node>>,
}

/// Parse a template. `name` is only used in error messages.
pub fn parse(name: &str, source: &str) -> Result<Template, ViewError> {
    let (layout, rest) = split_layout_directive(name, source)?;
    let mut template = Template {
        layout,
        ..Default::default()
    };

    let tokens = tokenize(name, rest)?;
    let mut stack: Vec<Frame> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for token in tokens {
        match token {
            Token::Text(text) => push_text(&mut current, text),
            Token::Comment => {}
            Token::Value(path) => current.push(Node::Value(path)),
            Token::Block(block) => {
                stack.push(Frame::Block(block, std::mem::take(&mut current)));
            }
            Token::Define(define) => {
                if !stack.is_empty() {
                    return Err(config_error(name, "define must appear at the top level"));
                }
                stack.push(Frame::Define(define, std::mem::take(&mut current)));
            }
            Token::End => match stack.pop() {
                Some(Frame::Block(block, mut parent)) => {
                    let default = std::mem::take(&mut current);
                    parent.push(Node::Block {
                        name: block,
                        default,
                    });
                    current = parent;
                }
                Some(Frame::Define(define, parent)) => {
                    let body = std::mem::replace(&mut current, parent);
                    if template.defines.insert(define.clone(), body).is_some() {
                        return Err(config_error(name, &format!("duplicate define \"{}\"", define)));
                    }
                }
                None => return Err(config_error(name, "unexpected {{ end }}")),
            },
        }
    }

    if let Some(frame) = stack.last() {
        let open = match frame {
            Frame::Block(n, _) => format!("block \"{}\"", n),
            Frame::Define(n, _) => format!("define \"{}\"", n),
        };
        return Err(config_error(name, &format!("unclosed {}", open)));
    }

    template.body = current;
    Ok(template)
}

enum Frame {
    Block(String, Vec<Node>),
    Define(String, Vec<Node>),
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Comment,
    Value(Vec<String>),
    Block(String),
    Define(String),
    End,
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

/// Strip a leading `<!--layout:NAME-->` directive.
fn split_layout_directive<'a>(
    name: &str,
    source: &'a str,
) -> Result<(Option<String>, &'a str), ViewError> {
    let trimmed = source.trim_start();
    let Some(comment) = trimmed.strip_prefix(COMMENT_OPEN) else {
        return Ok((None, source));
    };
    if !comment.trim_start().starts_with(LAYOUT_KEY) {
        return Ok((None, source));
    }

    let Some((inner, rest)) = comment.split_once(COMMENT_CLOSE) else {
        return Err(config_error(name, "unterminated layout directive"));
    };
    let layout = inner.trim_start()[LAYOUT_KEY.len()..].trim();
    if layout.is_empty() || layout.contains(char::is_whitespace) || layout.contains('"') {
        return Err(config_error(name, "malformed layout directive"));
    }

    Ok((Some(layout.to_string()), rest))
}

fn tokenize<'a>(name: &str, source: &'a str) -> Result<Vec<Token<'a>>, ViewError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut trim_next = false;

    while let Some(start) = rest.find(ACTION_OPEN) {
        let mut text = &rest[..start];
        if trim_next {
            text = text.trim_start();
        }

        let after_open = &rest[start + ACTION_OPEN.len()..];
        let Some(end) = after_open.find(ACTION_CLOSE) else {
            return Err(config_error(name, "unterminated action"));
        };
        let mut action = &after_open[..end];
        rest = &after_open[end + ACTION_CLOSE.len()..];

        // `{{- ` and ` -}}` trim the surrounding whitespace
        if let Some(a) = action.strip_prefix("- ") {
            text = text.trim_end();
            action = a;
        }
        trim_next = false;
        if let Some(a) = action.strip_suffix(" -") {
            trim_next = true;
            action = a;
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }
        tokens.push(parse_action(name, action.trim())?);
    }

    let tail = if trim_next { rest.trim_start() } else { rest };
    if !tail.is_empty() {
        tokens.push(Token::Text(tail));
    }
    Ok(tokens)
}

fn parse_action<'a>(name: &str, action: &str) -> Result<Token<'a>, ViewError> {
    if action.starts_with("/*") && action.ends_with("*/") {
        return Ok(Token::Comment);
    }
    if action == "end" {
        return Ok(Token::End);
    }
    if let Some(args) = keyword_args(action, "block") {
        let (block, tail) = quoted_name(name, args)?;
        if !(tail.is_empty() || tail == ".") {
            return Err(config_error(name, &format!("unsupported block argument: {}", tail)));
        }
        return Ok(Token::Block(block));
    }
    if let Some(args) = keyword_args(action, "define") {
        let (define, tail) = quoted_name(name, args)?;
        if !tail.is_empty() {
            return Err(config_error(name, "define takes only a name"));
        }
        return Ok(Token::Define(define));
    }
    if action == "." {
        return Ok(Token::Value(Vec::new()));
    }
    if let Some(path) = action.strip_prefix('.') {
        let fields: Vec<String> = path.split('.').map(str::to_string).collect();
        if fields
            .iter()
            .all(|f| !f.is_empty() && f.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'))
        {
            return Ok(Token::Value(fields));
        }
    }

    Err(config_error(name, &format!("unsupported action: {{{{ {} }}}}", action)))
}

fn keyword_args<'a>(action: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = action.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

fn quoted_name<'a>(name: &str, args: &'a str) -> Result<(String, &'a str), ViewError> {
    let Some(quoted) = args.strip_prefix('"') else {
        return Err(config_error(name, "expected quoted template name"));
    };
    let Some((value, tail)) = quoted.split_once('"') else {
        return Err(config_error(name, "unterminated template name"));
    };
    if value.is_empty() {
        return Err(config_error(name, "empty template name"));
    }
    Ok((value.to_string(), tail.trim()))
}

fn config_error(name: &str, message: &str) -> ViewError {
    ViewError::Configuration(format!("{}: {}", name, message))
}
