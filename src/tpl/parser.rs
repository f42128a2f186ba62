use crate::Result;
use crate::error::TemplateError;
use crate::tpl::ast::{AstNode, Expr, Program, VarRegistry};
use crate::tpl::expr::{compile_expr, register};
use crate::tpl::lexer::{Token, TokenKind, tokenize};

/// An open block waiting for its `end` tag.
///
/// Pushed by `{% if %}` / `{% for %}` together with a fresh body on
/// `nodes_stack`, popped by the matching `{% endif %}` / `{% endfor %}`.
enum TagFrame {
    If { test: Expr },
    For { item: String, collection: Expr },
}

impl TagFrame {
    fn kind(&self) -> &'static str {
        match self {
            TagFrame::If { .. } => "if",
            TagFrame::For { .. } => "for",
        }
    }

    fn into_node(self, body: Vec<AstNode>) -> AstNode {
        match self {
            TagFrame::If { test } => AstNode::If { test, body },
            TagFrame::For { item, collection } => AstNode::For {
                item,
                collection,
                body,
            },
        }
    }
}

/// Builds the instruction tree from the token stream.
///
/// Supports:
/// - Literal text
/// - Output: `{{ expr }}`
/// - Conditionals: `{% if expr %}...{% endif %}`
/// - Loops: `{% for x in expr %}...{% endfor %}`
/// - Comments: `{# ... #}`, dropped
struct Parser {
    /// A stack of node collections. Each level is the body of an open block;
    /// the first element is always the root level.
    nodes_stack: Vec<Vec<AstNode>>,
    /// A stack of blocks being parsed, parallel to `nodes_stack[1..]`.
    tag_stack: Vec<TagFrame>,
    vars: VarRegistry,
}

impl Parser {
    fn new() -> Self {
        Self {
            nodes_stack: vec![Vec::new()],
            tag_stack: Vec::new(),
            vars: VarRegistry::default(),
        }
    }

    fn parse(mut self, template: &str) -> Result<Program> {
        for token in tokenize(template) {
            match token.kind {
                TokenKind::Comment => continue,
                TokenKind::Literal => self.append_text(token.text),
                TokenKind::Output => {
                    let expr = compile_expr(token.inner(), &mut self.vars.all_vars)?;
                    self.append_node(AstNode::Output(expr));
                }
                TokenKind::Action => self.handle_action(&token)?,
            }
        }

        if let Some(open) = self.tag_stack.last() {
            return Err(TemplateError::syntax("Unmatched action tag", open.kind()));
        }

        Ok(Program {
            nodes: self.nodes_stack.pop().unwrap_or_default(),
            vars: self.vars,
        })
    }

    fn handle_action(&mut self, token: &Token) -> Result<()> {
        let words: Vec<&str> = token.inner().split_whitespace().collect();
        match words.first().copied() {
            Some("if") => self.handle_if_tag(&words, token.text),
            Some("for") => self.handle_for_tag(&words, token.text),
            Some(word) if word.starts_with("end") => self.handle_end_tag(&words, token.text),
            Some(word) => Err(TemplateError::syntax("Don't understand tag", word)),
            None => Err(TemplateError::syntax("Don't understand tag", token.text)),
        }
    }

    /// Handle `{% if expr %}`
    fn handle_if_tag(&mut self, words: &[&str], text: &str) -> Result<()> {
        if words.len() != 2 {
            return Err(TemplateError::syntax("Don't understand if", text));
        }
        let test = compile_expr(words[1], &mut self.vars.all_vars)?;
        self.open(TagFrame::If { test });
        Ok(())
    }

    /// Handle `{% for item in collection %}`
    fn handle_for_tag(&mut self, words: &[&str], text: &str) -> Result<()> {
        if words.len() != 4 || words[2] != "in" {
            return Err(TemplateError::syntax("Don't understand for", text));
        }
        register(words[1], &mut self.vars.loop_vars)?;
        let collection = compile_expr(words[3], &mut self.vars.all_vars)?;
        self.open(TagFrame::For {
            item: words[1].to_string(),
            collection,
        });
        Ok(())
    }

    /// Handle `{% endif %}` and `{% endfor %}`.
    fn handle_end_tag(&mut self, words: &[&str], text: &str) -> Result<()> {
        if words.len() != 1 {
            return Err(TemplateError::syntax("Don't understand end", text));
        }
        let end_what = &words[0][3..];
        let frame = self
            .tag_stack
            .pop()
            .ok_or_else(|| TemplateError::syntax("Too many ends", text))?;
        if frame.kind() != end_what {
            return Err(TemplateError::syntax("Mismatched end tag", end_what));
        }

        let body = self.nodes_stack.pop().unwrap_or_default();
        self.append_node(frame.into_node(body));
        Ok(())
    }

    fn open(&mut self, frame: TagFrame) {
        self.nodes_stack.push(Vec::new());
        self.tag_stack.push(frame);
    }

    /// Append a node to the current active scope.
    fn append_node(&mut self, node: AstNode) {
        if let Some(nodes) = self.nodes_stack.last_mut() {
            nodes.push(node);
        }
    }

    /// Append text, merging with the previous text node when possible.
    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(nodes) = self.nodes_stack.last_mut() {
            if let Some(AstNode::Text(last_text)) = nodes.last_mut() {
                last_text.push_str(text);
            } else {
                nodes.push(AstNode::Text(text.to_string()));
            }
        }
    }
}

/// Main entry point: compile a template string into a [`Program`].
pub fn parse_template(template: &str) -> Result<Program> {
    Parser::new().parse(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_message(tpl: &str) -> String {
        match parse_template(tpl) {
            Err(TemplateError::TemplateSyntax(msg)) => msg,
            other => panic!("Expected TemplateSyntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_text() {
        let program = parse_template("hello world").unwrap();
        assert_eq!(program.nodes, vec![AstNode::Text("hello world".to_string())]);
        assert!(program.vars.all_vars.is_empty());
    }

    #[test]
    fn test_parse_output() {
        let program = parse_template("hello {{ name }}!").unwrap();
        assert_eq!(program.nodes.len(), 3);
        match &program.nodes[1] {
            AstNode::Output(Expr::Var(v)) => assert_eq!(v, "name"),
            other => panic!("Expected Output, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_dropped() {
        let program = parse_template("a{# note #}b").unwrap();
        assert_eq!(program.nodes, vec![AstNode::Text("ab".to_string())]);
    }

    #[test]
    fn test_parse_nested() {
        let tpl = "{% if x %}{% for i in list %}{{ i }}{% endfor %}{% endif %}";
        let program = parse_template(tpl).unwrap();
        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::If { test, body } => {
                assert_eq!(test, &Expr::Var("x".to_string()));
                assert_eq!(body.len(), 1);
                match &body[0] {
                    AstNode::For { item, body, .. } => {
                        assert_eq!(item, "i");
                        assert_eq!(body.len(), 1);
                    }
                    other => panic!("Expected For, got {:?}", other),
                }
            }
            other => panic!("Expected If, got {:?}", other),
        }

        let all: Vec<&str> = program.vars.all_vars.iter().map(String::as_str).collect();
        assert_eq!(all, vec!["i", "list", "x"]);
        let free: Vec<&str> = program.vars.free_vars().collect();
        assert_eq!(free, vec!["list", "x"]);
    }

    #[test]
    fn test_text_after_block_returns_to_parent() {
        let program = parse_template("{% if a %}in{% endif %}out").unwrap();
        assert_eq!(program.nodes.len(), 2);
        assert_eq!(program.nodes[1], AstNode::Text("out".to_string()));
    }

    #[test]
    fn test_unmatched_blocks() {
        assert_eq!(syntax_message("{% if cond %}"), "Unmatched action tag: \"if\"");
        assert_eq!(
            syntax_message("{% if a %}{% for b in c %}"),
            "Unmatched action tag: \"for\""
        );
    }

    #[test]
    fn test_mismatched_end() {
        assert_eq!(
            syntax_message("{% if cond %}{% for x in y %}{% endif %}"),
            "Mismatched end tag: \"if\""
        );
    }

    #[test]
    fn test_too_many_ends() {
        assert_eq!(
            syntax_message("{% if a %}{% endif %}{% endif %}"),
            "Too many ends: \"{% endif %}\""
        );
    }

    #[test]
    fn test_malformed_tags() {
        assert!(syntax_message("{% if %}{% endif %}").starts_with("Don't understand if"));
        assert!(syntax_message("{% if a b %}{% endif %}").starts_with("Don't understand if"));
        assert!(syntax_message("{% for %}{% endfor %}").starts_with("Don't understand for"));
        assert!(syntax_message("{% for x on y %}{% endfor %}").starts_with("Don't understand for"));
        assert!(syntax_message("{% if a %}{% endif a %}").starts_with("Don't understand end"));
        assert_eq!(
            syntax_message("{% customtag %}{% endcustomtag %}"),
            "Don't understand tag: \"customtag\""
        );
        assert!(syntax_message("{%  %}").starts_with("Don't understand tag"));
    }

    #[test]
    fn test_invalid_loop_variable() {
        let err = parse_template("{% for !! in $$ %}{% endfor %}").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax(_)));
    }
}
