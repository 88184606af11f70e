//! Parser for unexposed template argument strings.
//!
//! The front-end occasionally surfaces a template argument only as text, for
//! instance when the type is dependent. This module tokenizes such strings
//! and rebuilds a [`TemplateParameter`] tree so emitters can still render
//! nesting. Whatever cannot be interpreted stays in the tree as opaque text;
//! nothing is dropped.

use crate::model::{render_template_arguments, TemplateParameter};

/// Keywords that carry no type information in an argument list.
fn is_dropped_keyword(token: &str) -> bool {
    matches!(token, "class" | "typename" | "struct")
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Scope,
    Lt,
    Gt,
    Comma,
    Star,
    Amp,
    AmpAmp,
    Ellipsis,
    Open(char),
    Close(char),
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            ':' => {
                chars.next();
                if chars.peek() == Some(&':') {
                    chars.next();
                    tokens.push(Token::Scope);
                }
                // A lone ':' has no meaning here and is dropped.
            }
            '<' => {
                chars.next();
                tokens.push(Token::Lt);
            }
            '>' => {
                // ">>" always closes two lists; the tokenizer never sees a
                // shift operator in a type string.
                chars.next();
                tokens.push(Token::Gt);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '&' => {
                chars.next();
                if chars.peek() == Some(&'&') {
                    chars.next();
                    tokens.push(Token::AmpAmp);
                } else {
                    tokens.push(Token::Amp);
                }
            }
            '.' => {
                chars.next();
                if chars.peek() == Some(&'.') {
                    chars.next();
                    if chars.peek() == Some(&'.') {
                        chars.next();
                    }
                    tokens.push(Token::Ellipsis);
                }
            }
            '(' | '[' => {
                chars.next();
                tokens.push(Token::Open(ch));
            }
            ')' | ']' => {
                chars.next();
                tokens.push(Token::Close(if ch == ')' { ')' } else { ']' }));
            }
            _ => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace()
                        || matches!(c, ':' | '<' | '>' | ',' | '*' | '&' | '.' | '(' | ')' | '[' | ']')
                    {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                if !ident.is_empty() {
                    tokens.push(Token::Ident(ident));
                }
            }
        }
    }
    tokens
}

/// Accumulates one argument while its tokens stream past.
#[derive(Default)]
struct ArgumentBuilder {
    text: String,
    children: Vec<TemplateParameter>,
    is_variadic: bool,
}

impl ArgumentBuilder {
    fn is_empty(&self) -> bool {
        self.text.is_empty() && self.children.is_empty() && !self.is_variadic
    }

    /// Appending text after a child list was attached flattens the children
    /// back into the text so that trailing suffixes (`vector<int>::iterator`)
    /// survive verbatim.
    fn flatten_children(&mut self) {
        if !self.children.is_empty() {
            let rendered = render_template_arguments(&self.children);
            self.text.push_str(&rendered);
            self.children.clear();
        }
    }

    fn push_word(&mut self, word: &str) {
        self.flatten_children();
        if self.text.is_empty() || self.text.ends_with("::") {
            self.text.push_str(word);
        } else {
            self.text.push(' ');
            self.text.push_str(word);
        }
    }

    fn push_punct(&mut self, punct: &str) {
        self.flatten_children();
        self.text.push_str(punct);
    }

    fn finish(mut self, ns_resolve: &dyn Fn(&str) -> String) -> Option<TemplateParameter> {
        if self.is_empty() {
            return None;
        }
        let resolved = ns_resolve(&self.text);
        let mut param = TemplateParameter::unexposed_argument(resolved);
        param.params = std::mem::take(&mut self.children);
        param.is_variadic = self.is_variadic;
        Some(param)
    }
}

/// Parses a type expression into its argument tree.
///
/// `A<B<C,D>,E>` yields one parameter `A` with children `[B<C,D>, E]`.
/// `ns_resolve` expands aliases and typedefs known to the caller; pass the
/// identity function when no context is available.
pub fn parse_unexposed_template_params(
    input: &str,
    ns_resolve: &dyn Fn(&str) -> String,
) -> Vec<TemplateParameter> {
    let tokens = tokenize(input);
    let mut position = 0;
    parse_argument_list(&tokens, &mut position, ns_resolve)
}

/// Parses arguments until a closing `>` or the end of input. An unterminated
/// list is closed best-effort: the current argument is finalized with
/// whatever it accumulated.
fn parse_argument_list(
    tokens: &[Token],
    position: &mut usize,
    ns_resolve: &dyn Fn(&str) -> String,
) -> Vec<TemplateParameter> {
    let mut arguments: Vec<TemplateParameter> = Vec::new();
    let mut current = ArgumentBuilder::default();

    while *position < tokens.len() {
        let token = &tokens[*position];
        *position += 1;
        match token {
            Token::Ident(word) => {
                if !is_dropped_keyword(word) {
                    current.push_word(word);
                }
            }
            Token::Scope => current.push_punct("::"),
            Token::Star => current.push_punct("*"),
            Token::Amp => current.push_punct("&"),
            Token::AmpAmp => current.push_punct("&&"),
            Token::Open(c) => current.push_punct(&c.to_string()),
            Token::Close(c) => current.push_punct(&c.to_string()),
            Token::Ellipsis => {
                if current.is_empty() {
                    if let Some(last) = arguments.last_mut() {
                        last.is_variadic = true;
                    }
                } else {
                    current.is_variadic = true;
                }
            }
            Token::Lt => {
                let children = parse_argument_list(tokens, position, ns_resolve);
                current.flatten_children();
                current.children = children;
            }
            Token::Comma => {
                if let Some(param) = std::mem::take(&mut current).finish(ns_resolve) {
                    arguments.push(param);
                }
            }
            Token::Gt => {
                if let Some(param) = std::mem::take(&mut current).finish(ns_resolve) {
                    arguments.push(param);
                }
                return arguments;
            }
        }
    }
    if let Some(param) = current.finish(ns_resolve) {
        arguments.push(param);
    }
    arguments
}

/// Identity resolver for callers without alias context.
pub fn no_resolve(name: &str) -> String {
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<TemplateParameter> {
        parse_unexposed_template_params(input, &no_resolve)
    }

    #[test]
    fn test_nested_arguments() {
        let parsed = parse("A<B<C,D>,E>");
        assert_eq!(parsed.len(), 1);
        let a = &parsed[0];
        assert_eq!(a.type_name.as_deref(), Some("A"));
        assert_eq!(a.params.len(), 2);
        let b = &a.params[0];
        assert_eq!(b.type_name.as_deref(), Some("B"));
        assert_eq!(b.params.len(), 2);
        assert_eq!(b.params[0].type_name.as_deref(), Some("C"));
        assert_eq!(b.params[1].type_name.as_deref(), Some("D"));
        assert_eq!(a.params[1].type_name.as_deref(), Some("E"));
        assert!(a.is_unexposed);
    }

    #[test]
    fn test_spaced_and_collapsed_closers_are_equal() {
        assert_eq!(parse("A<B<C,D> >"), parse("A<B<C,D>>"));
    }

    #[test]
    fn test_comma_spacing_is_normalized() {
        assert_eq!(parse("Map<K, V>"), parse("Map<K,V>"));
    }

    #[test]
    fn test_variadic_attaches_to_preceding_parameter() {
        let parsed = parse("Tuple<Ts...>");
        assert_eq!(parsed[0].params.len(), 1);
        assert!(parsed[0].params[0].is_variadic);
        assert_eq!(parsed[0].params[0].type_name.as_deref(), Some("Ts"));
    }

    #[test]
    fn test_keywords_are_dropped() {
        let parsed = parse("X<class T, typename U>");
        let names: Vec<_> = parsed[0]
            .params
            .iter()
            .map(|p| p.type_name.clone().unwrap())
            .collect();
        assert_eq!(names, ["T", "U"]);
    }

    #[test]
    fn test_qualifiers_attach_to_type() {
        let parsed = parse("V<const int&>");
        assert_eq!(parsed[0].params[0].type_name.as_deref(), Some("const int&"));

        let parsed = parse("V<T&&>");
        assert_eq!(parsed[0].params[0].type_name.as_deref(), Some("T&&"));
    }

    #[test]
    fn test_unterminated_list_closes_best_effort() {
        let parsed = parse("A<B<C");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].type_name.as_deref(), Some("A"));
        assert_eq!(parsed[0].params[0].type_name.as_deref(), Some("B"));
        assert_eq!(parsed[0].params[0].params[0].type_name.as_deref(), Some("C"));
    }

    #[test]
    fn test_scoped_names_stay_joined() {
        let parsed = parse("std::map<std::string,int>");
        assert_eq!(parsed[0].type_name.as_deref(), Some("std::map"));
        assert_eq!(
            parsed[0].params[0].type_name.as_deref(),
            Some("std::string")
        );
    }

    #[test]
    fn test_ns_resolve_expands_aliases() {
        let resolve = |name: &str| {
            if name == "Str" {
                "std::string".to_string()
            } else {
                name.to_string()
            }
        };
        let parsed = parse_unexposed_template_params("V<Str>", &resolve);
        assert_eq!(
            parsed[0].params[0].type_name.as_deref(),
            Some("std::string")
        );
    }

    #[test]
    fn test_suffix_after_children_is_preserved() {
        let parsed = parse("vector<int>::iterator");
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed[0].type_name.as_deref(),
            Some("vector<int>::iterator")
        );
        assert!(parsed[0].params.is_empty());
    }
}
