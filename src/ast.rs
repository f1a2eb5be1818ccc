use std::borrow::Cow;

/// Escaping policy attached to an [`Node::Insert`] expression.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Escaping {
    /// Echo the expression as-is.
    Disabled,
    /// Escape, but leave already-encoded entities intact.
    Once,
    /// Escape unconditionally, re-encoding anything already encoded.
    Repeated,
}

/// One attribute declaration on a [`Node::Tag`].
///
/// A named declaration contributes a `(name, value)` pair to the runtime
/// merge call. A declaration without a name is an interpolation: its value
/// renders to a pre-escaped fragment that is passed through verbatim.
/// Declaration order is significant and is preserved into the emitted call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl<'a> {
    pub name: Option<Node<'a>>,
    pub value: Node<'a>,
}

/// A chained continuation clause of a [`Node::Block`], e.g. `else` or
/// `elseif (...)`. Only valid on a block that has a body: the emitted PHP
/// closes the open scope and reopens it with the new head.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MidBlock<'a> {
    pub head: Cow<'a, str>,
    pub children: Vec<Node<'a>>,
}

/// A template AST node, handed to the renderer by the parser.
///
/// Nodes are immutable once built; the renderer only reads them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    /// Ordered sequence of top-level children.
    Root(Vec<Node<'a>>),
    /// A literal run of template text: emitted verbatim (after neutralizing
    /// anything that would open a PHP section), or as a PHP string literal
    /// when it ends up inside an expression.
    ///
    /// If the source contained no escapes this will be Borrowed - otherwise
    /// the parser was forced to allocate.
    Text { content: Cow<'a, str> },
    /// An ordered sequence of child nodes concatenated together, e.g. a
    /// quoted attribute value mixing literal text and `#{...}` inserts.
    InterpolatedString { children: Vec<Node<'a>> },
    /// A PHP expression spliced into the output.
    Insert {
        content: Cow<'a, str>,
        escaping: Escaping,
    },
    /// A control-flow head (`if (...)`, `foreach ($xs as $x)`, ...) with an
    /// optional body and optionally chained mid clauses.
    Block {
        head: Cow<'a, str>,
        children: Vec<Node<'a>>,
        mids: Vec<MidBlock<'a>>,
    },
    /// An element with ordered attribute declarations.
    Tag {
        name: Cow<'a, str>,
        attributes: Vec<AttributeDecl<'a>>,
        children: Vec<Node<'a>>,
    },
    /// An object class reference: the generated code derives a CSS class
    /// name from the referenced value's type at template runtime.
    ObjectRefClass {
        value: Box<Node<'a>>,
        prefix: Option<Box<Node<'a>>>,
    },
    /// An object id reference: the generated code derives a `type_identity`
    /// DOM id from the referenced value at template runtime.
    ObjectRefId {
        value: Box<Node<'a>>,
        prefix: Option<Box<Node<'a>>>,
    },
}
