mod ast;
mod error;
mod escape;
mod renderer;
mod runtime;

pub use ast::{AttributeDecl, Escaping, MidBlock, Node};
pub use error::{HamelinError, HamelinResult};
pub use escape::escape_html;
pub use renderer::{RenderOptions, render};
pub use runtime::{
    AttrValue, AttributeItem, ObjectRef, joined_value, object_ref_class_string, render_attributes,
    render_object_ref_class, render_object_ref_id,
};
