use tracing::{debug, trace};

use crate::HamelinResult;
use crate::ast::{AttributeDecl, Escaping, Node};
use crate::error::HamelinError;
use crate::escape::{escape_language, string_literal};

/// Configuration threaded through a render call.
///
/// `format` selects boolean-attribute rendering in the emitted runtime
/// calls (`html5` renders `checked`, anything else `checked="checked"`);
/// `charset` is embedded into every generated `htmlspecialchars` call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: String,
    pub charset: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: "html5".to_owned(),
            charset: "UTF-8".to_owned(),
        }
    }
}

/// Renders a template tree to PHP source.
///
/// The traversal is strictly depth-first with no suspension points; all
/// state (output buffer, echo-mode stack) is call-local, so independent
/// renders may run in parallel.
///
/// # Errors
/// - If the tree is structurally invalid, e.g. an `else` clause chained to
///   a block without a body.
///
/// # Example
///
/// ```
/// use hamelin::{Escaping, Node, RenderOptions, render};
///
/// let tree = Node::Insert {
///     content: "$greeting".into(),
///     escaping: Escaping::Once,
/// };
/// let php = render(&tree, &RenderOptions::default()).unwrap();
/// assert_eq!(
///     php,
///     "<?php echo htmlspecialchars($greeting,ENT_QUOTES,'UTF-8',false); ?>"
/// );
/// ```
pub fn render(node: &Node<'_>, options: &RenderOptions) -> HamelinResult<String> {
    debug!(format = %options.format, charset = %options.charset, "rendering template tree");

    let mut renderer = Renderer::new(options);
    renderer.visit(node)?;
    debug_assert!(
        renderer.echo_stack.is_empty(),
        "echo mode stack must balance"
    );
    Ok(renderer.output)
}

struct Renderer<'a> {
    options: &'a RenderOptions,
    output: String,
    /// Pushed around sub-renders that suspend direct echoing. Empty stack
    /// means echo mode: the root of a template writes output directly.
    echo_stack: Vec<bool>,
}

impl<'a> Renderer<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            output: String::new(),
            echo_stack: Vec::new(),
        }
    }

    fn raw(&mut self, fragment: &str) {
        self.output.push_str(fragment);
    }

    fn is_echo_mode(&self) -> bool {
        self.echo_stack.last().copied().unwrap_or(true)
    }

    fn push_echo_mode(&mut self, echo: bool) {
        self.echo_stack.push(echo);
    }

    fn pop_echo_mode(&mut self) {
        self.echo_stack.pop();
    }

    fn visit(&mut self, node: &Node<'_>) -> HamelinResult<()> {
        match node {
            Node::Root(children) => self.visit_children(children)?,
            Node::Text { content } => {
                if self.is_echo_mode() {
                    let escaped = escape_language(content);
                    self.raw(&escaped);
                } else {
                    // As part of an expression, literal text becomes a PHP
                    // string literal.
                    let literal = string_literal(content);
                    self.raw(&literal);
                }
            }
            Node::InterpolatedString { children } => {
                // A multi-part string only needs grouping when it becomes
                // part of a larger expression; in echo mode each child
                // already writes sequentially.
                let grouped = !self.is_echo_mode() && children.len() > 1;
                if grouped {
                    self.raw("(");
                }
                for (n, child) in children.iter().enumerate() {
                    if n != 0 && !self.is_echo_mode() {
                        self.raw(" . ");
                    }
                    self.visit(child)?;
                }
                if grouped {
                    self.raw(")");
                }
            }
            Node::Insert { content, escaping } => self.visit_insert(content, *escaping),
            Node::Block {
                head,
                children,
                mids,
            } => {
                if children.is_empty() {
                    if let Some(mid) = mids.first() {
                        return Err(HamelinError::DanglingMidBlock {
                            head: mid.head.clone().into_owned(),
                        });
                    }
                    self.raw("<?php ");
                    self.raw(head);
                    self.raw("; ?>");
                } else {
                    self.raw("<?php ");
                    self.raw(head);
                    self.raw(" { ?>");
                    self.visit_children(children)?;
                    for mid in mids {
                        self.raw("<?php } ");
                        self.raw(&mid.head);
                        self.raw(" { ?>");
                        self.visit_children(&mid.children)?;
                    }
                    self.raw("<?php } ?>");
                }
            }
            Node::Tag {
                name,
                attributes,
                children,
            } => {
                self.raw("<");
                self.raw(name);
                if !attributes.is_empty() {
                    self.visit_dynamic_attributes(attributes)?;
                }
                self.raw(">");
                self.visit_children(children)?;
                self.raw("</");
                self.raw(name);
                self.raw(">");
            }
            Node::ObjectRefClass { value, prefix } => {
                self.visit_object_ref("renderObjectRefClass", value, prefix.as_deref())?;
            }
            Node::ObjectRefId { value, prefix } => {
                self.visit_object_ref("renderObjectRefId", value, prefix.as_deref())?;
            }
        }
        Ok(())
    }

    fn visit_children(&mut self, children: &[Node<'_>]) -> HamelinResult<()> {
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_insert(&mut self, content: &str, escaping: Escaping) {
        if self.is_echo_mode() {
            match escaping {
                Escaping::Disabled => {
                    self.raw("<?php echo ");
                    self.raw(content);
                    self.raw("; ?>");
                }
                Escaping::Once => {
                    let call = format!(
                        "<?php echo htmlspecialchars({content},ENT_QUOTES,'{}',false); ?>",
                        self.options.charset
                    );
                    self.raw(&call);
                }
                Escaping::Repeated => {
                    let call = format!(
                        "<?php echo htmlspecialchars({content},ENT_QUOTES,'{}'); ?>",
                        self.options.charset
                    );
                    self.raw(&call);
                }
            }
        } else if is_simple_variable(content) {
            // A plain variable reference embeds safely anywhere.
            self.raw(content);
        } else {
            // Protect compound expressions from operator precedence when
            // concatenated into a larger expression.
            self.raw("(");
            self.raw(content);
            self.raw(")");
        }
    }

    fn visit_object_ref(
        &mut self,
        function: &str,
        value: &Node<'_>,
        prefix: Option<&Node<'_>>,
    ) -> HamelinResult<()> {
        let echoed = self.is_echo_mode();
        if echoed {
            self.raw("<?php echo ");
        }
        self.raw("Hamelin\\Runtime::");
        self.raw(function);
        self.raw("(");

        self.push_echo_mode(false);
        let result = self.visit_object_ref_args(value, prefix);
        self.pop_echo_mode();
        result?;

        self.raw(")");
        if self.is_echo_mode() {
            self.raw("; ?>");
        }
        Ok(())
    }

    fn visit_object_ref_args(
        &mut self,
        value: &Node<'_>,
        prefix: Option<&Node<'_>>,
    ) -> HamelinResult<()> {
        self.visit(value)?;
        if let Some(prefix) = prefix {
            // Argument separator on entering the prefix child.
            self.raw(", ");
            self.visit(prefix)?;
        }
        Ok(())
    }

    fn visit_dynamic_attributes(&mut self, attributes: &[AttributeDecl<'_>]) -> HamelinResult<()> {
        trace!(count = attributes.len(), "emitting dynamic attribute call");

        self.raw(" <?php echo Hamelin\\Runtime::renderAttributes(array(");

        self.push_echo_mode(false);
        let result = self.visit_attribute_items(attributes);
        self.pop_echo_mode();
        result?;

        self.raw(")");
        self.raw(", ");
        let format = string_literal(&self.options.format);
        self.raw(&format);
        self.raw(", ");
        let charset = string_literal(&self.options.charset);
        self.raw(&charset);
        self.raw("); ?>");
        Ok(())
    }

    fn visit_attribute_items(&mut self, attributes: &[AttributeDecl<'_>]) -> HamelinResult<()> {
        for (n, attribute) in attributes.iter().enumerate() {
            if n != 0 {
                self.raw(", ");
            }
            match &attribute.name {
                None => {
                    self.raw("Hamelin\\Runtime\\AttributeInterpolation::create(");
                    self.visit(&attribute.value)?;
                    self.raw(")");
                }
                Some(name) => {
                    self.raw("array(");
                    self.visit(name)?;
                    self.raw(", ");
                    self.visit(&attribute.value)?;
                    self.raw(")");
                }
            }
        }
        Ok(())
    }
}

/// Matches a bare variable reference: an optional `$` sigil followed by
/// identifier characters (ASCII alphanumerics, `_`, or anything beyond
/// `\x7f`).
fn is_simple_variable(expr: &str) -> bool {
    let body = expr.strip_prefix('$').unwrap_or(expr);
    !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c >= '\u{7f}')
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::ast::MidBlock;

    fn insert(content: &str) -> Node<'_> {
        Node::Insert {
            content: Cow::Borrowed(content),
            escaping: Escaping::Disabled,
        }
    }

    #[test]
    fn simple_variable_shapes() {
        assert!(is_simple_variable("$user"));
        assert!(is_simple_variable("user_name2"));
        assert!(is_simple_variable("$variable_naïve"));
        assert!(!is_simple_variable("$user->name"));
        assert!(!is_simple_variable("1 + 2"));
        assert!(!is_simple_variable("$"));
        assert!(!is_simple_variable(""));
    }

    #[test]
    fn echo_stack_balances_after_render_error() {
        let dangling = Node::Block {
            head: Cow::Borrowed("if ($a)"),
            children: vec![],
            mids: vec![MidBlock {
                head: Cow::Borrowed("else"),
                children: vec![],
            }],
        };
        // Nest the invalid block inside an attribute value, so the failure
        // crosses a pushed mode boundary on the way out.
        let tree = Node::Tag {
            name: Cow::Borrowed("div"),
            attributes: vec![AttributeDecl {
                name: Some(insert("'a'")),
                value: dangling,
            }],
            children: vec![],
        };

        let options = RenderOptions::default();
        let mut renderer = Renderer::new(&options);
        assert_eq!(
            renderer.visit(&tree),
            Err(HamelinError::DanglingMidBlock {
                head: "else".to_owned()
            })
        );
        assert!(
            renderer.echo_stack.is_empty(),
            "pushes must be popped on error paths too"
        );
    }

    #[test]
    fn insert_in_value_mode_parenthesizes_compound_expressions() {
        let options = RenderOptions::default();
        let mut renderer = Renderer::new(&options);
        renderer.push_echo_mode(false);
        renderer.visit_insert("$a . $b", Escaping::Disabled);
        renderer.visit_insert("$plain", Escaping::Disabled);
        renderer.pop_echo_mode();
        assert_eq!(renderer.output, "($a . $b)$plain");
    }
}
