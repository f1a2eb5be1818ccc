pub type HamelinResult<T> = std::result::Result<T, HamelinError>;

/// Errors surfaced while generating code from a template tree.
///
/// The renderer performs no local recovery: the first error aborts the
/// render and no partial output is valid. Malformed-but-representable
/// input is the parser's concern; the shapes the type system cannot rule
/// out are listed here.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum HamelinError {
    /// A continuation clause (`else`, `elseif`) was attached to a block
    /// without a body, so there is no open scope for it to continue.
    #[error("mid block `{head}` has no open block to continue")]
    DanglingMidBlock { head: String },
}
