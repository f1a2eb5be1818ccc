//! Native implementation of the runtime helpers called by generated
//! templates.
//!
//! The renderer emits PHP calls to `Hamelin\Runtime::renderAttributes`,
//! `Hamelin\Runtime::renderObjectRefClass` and
//! `Hamelin\Runtime::renderObjectRefId`; the functions here are the
//! reference semantics for those helpers. They are pure functions over
//! their arguments and safe to call from concurrent renders.

use std::borrow::Cow;

use crate::escape::escape_html;

/// A PHP-shaped attribute value.
///
/// `Map` keeps insertion order, which is significant for `data-*`
/// expansion.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Str(Cow<'a, str>),
    List(Vec<AttrValue<'a>>),
    Map(Vec<(Cow<'a, str>, AttrValue<'a>)>),
}

impl AttrValue<'_> {
    /// PHP string coercion. Iterables are out of contract for scalar
    /// positions and fall back to a space join.
    fn scalar_string(&self) -> String {
        match self {
            Self::Null | Self::Bool(false) => String::new(),
            Self::Bool(true) => "1".to_owned(),
            Self::Int(n) => n.to_string(),
            Self::Str(s) => s.clone().into_owned(),
            Self::List(_) | Self::Map(_) => joined_value(self, " ").unwrap_or_default(),
        }
    }
}

impl<'a> From<&'a str> for AttrValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(Cow::Borrowed(value))
    }
}

impl From<bool> for AttrValue<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// One item of the attribute list built by the generated code.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeItem<'a> {
    /// A pre-rendered, already escaped fragment, passed through verbatim.
    Interpolation(Cow<'a, str>),
    /// An ordinary named declaration.
    Pair {
        name: Cow<'a, str>,
        value: AttrValue<'a>,
    },
}

impl<'a> AttributeItem<'a> {
    pub fn pair(name: &'a str, value: impl Into<AttrValue<'a>>) -> Self {
        Self::Pair {
            name: Cow::Borrowed(name),
            value: value.into(),
        }
    }

    pub fn interpolation(fragment: &'a str) -> Self {
        Self::Interpolation(Cow::Borrowed(fragment))
    }
}

enum Slot {
    /// Verbatim pre-escaped fragment.
    Interpolation(String),
    /// Rendered as the bare attribute name: an html5 boolean, or a sole
    /// boolean `id`/`class` declaration that nothing joined with.
    NameOnly,
    Value(String),
}

/// Result of joining an `id`/`class` value. A bare boolean `true` passes
/// through uncoerced; it only becomes the string `1` when another
/// declaration concatenates with it.
enum Joined {
    True,
    Text(String),
}

impl Joined {
    fn coerced(self) -> String {
        match self {
            Self::True => "1".to_owned(),
            Self::Text(text) => text,
        }
    }

    fn into_slot(self) -> Slot {
        match self {
            Self::True => Slot::NameOnly,
            Self::Text(text) => Slot::Value(text),
        }
    }
}

fn joined_attr_value(value: &AttrValue<'_>, separator: &str) -> Option<Joined> {
    match value {
        AttrValue::List(_) | AttrValue::Map(_) => {
            joined_value(value, separator).map(Joined::Text)
        }
        AttrValue::Null | AttrValue::Bool(false) => None,
        AttrValue::Bool(true) => Some(Joined::True),
        AttrValue::Int(n) => Some(Joined::Text(n.to_string())),
        AttrValue::Str(s) => Some(Joined::Text(s.clone().into_owned())),
    }
}

struct TableEntry {
    /// None for anonymous interpolation fragments.
    key: Option<String>,
    slot: Slot,
}

fn position(table: &[TableEntry], name: &str) -> Option<usize> {
    table
        .iter()
        .position(|entry| entry.key.as_deref() == Some(name))
}

fn store_in_place(table: &mut Vec<TableEntry>, name: &str, slot: Slot) {
    match position(table, name).and_then(|i| table.get_mut(i)) {
        Some(entry) => entry.slot = slot,
        None => table.push(TableEntry {
            key: Some(name.to_owned()),
            slot,
        }),
    }
}

/// Renders a merged attribute string from an ordered list of declarations.
///
/// Special cases, in declaration order:
/// - a `data` attribute with an iterable value expands into `data-*`
///   attributes, first occurrence winning against the accumulated table;
///   with a non-iterable value it is stored as an ordinary attribute under
///   the literal name `data`
/// - `id` and `class` declarations join (separators `_` and ` `) and append
///   to an already-present entry instead of moving it; a sole boolean `true`
///   renders as the bare name and coerces to `1` only when another
///   declaration joins with it
/// - a `true` value renders as the bare attribute name in the `html5`
///   format and as `name="name"` in any other format
/// - a `false` or null value contributes nothing (and does not retract an
///   earlier declaration of the same name)
/// - any other re-declared name moves to the end of the output, keeping its
///   most recent value
///
/// Returns `None` when nothing remains to render. Names and values are
/// HTML-escaped without double-encoding; `charset` travels with the call
/// for parity with the generated runtime ABI (the native escaper operates
/// on UTF-8 strings).
pub fn render_attributes(
    list: &[AttributeItem<'_>],
    format: &str,
    charset: &str,
) -> Option<String> {
    let _ = charset;
    let mut table: Vec<TableEntry> = Vec::new();

    for item in list {
        match item {
            AttributeItem::Interpolation(fragment) => table.push(TableEntry {
                key: None,
                slot: Slot::Interpolation(fragment.clone().into_owned()),
            }),
            AttributeItem::Pair { name, value } => merge_pair(&mut table, name, value, format),
        }
    }

    if table.is_empty() {
        return None;
    }

    let mut result = String::new();
    for (n, entry) in table.iter().enumerate() {
        if n != 0 {
            result.push(' ');
        }
        let name = entry.key.as_deref().unwrap_or_default();
        match &entry.slot {
            Slot::Interpolation(fragment) => result.push_str(fragment),
            Slot::NameOnly => result.push_str(&escape_html(name, false)),
            Slot::Value(value) => {
                result.push_str(&escape_html(name, false));
                result.push_str("=\"");
                result.push_str(&escape_html(value, false));
                result.push('"');
            }
        }
    }

    Some(result)
}

fn merge_pair(table: &mut Vec<TableEntry>, name: &str, value: &AttrValue<'_>, format: &str) {
    if name == "data" {
        match value {
            AttrValue::Map(pairs) => {
                for (subname, subvalue) in pairs {
                    insert_data(table, format!("data-{subname}"), subvalue);
                }
            }
            AttrValue::List(items) => {
                for (index, subvalue) in items.iter().enumerate() {
                    insert_data(table, format!("data-{index}"), subvalue);
                }
            }
            AttrValue::Null
            | AttrValue::Bool(_)
            | AttrValue::Int(_)
            | AttrValue::Str(_) => {
                store_in_place(table, name, Slot::Value(value.scalar_string()));
            }
        }
    } else if name == "id" || name == "class" {
        let separator = if name == "id" { "_" } else { " " };
        if let Some(joined) = joined_attr_value(value, separator) {
            match position(table, name).and_then(|i| table.get_mut(i)) {
                Some(entry) => match &mut entry.slot {
                    Slot::Value(existing) => {
                        existing.push_str(separator);
                        existing.push_str(&joined.coerced());
                    }
                    // An earlier bare boolean coerces once something joins
                    // with it.
                    Slot::NameOnly => {
                        entry.slot = Slot::Value(format!("1{separator}{}", joined.coerced()));
                    }
                    Slot::Interpolation(_) => entry.slot = joined.into_slot(),
                },
                None => table.push(TableEntry {
                    key: Some(name.to_owned()),
                    slot: joined.into_slot(),
                }),
            }
        }
    } else if matches!(value, AttrValue::Bool(true)) {
        let slot = if format == "html5" {
            Slot::NameOnly
        } else {
            Slot::Value(name.to_owned())
        };
        store_in_place(table, name, slot);
    } else if matches!(value, AttrValue::Bool(false) | AttrValue::Null) {
        // Suppressed. Deliberately does not retract an earlier entry.
    } else {
        // Re-insertion at the end so the attribute's position reflects its
        // last declaration.
        if let Some(i) = position(table, name) {
            table.remove(i);
        }
        table.push(TableEntry {
            key: Some(name.to_owned()),
            slot: Slot::Value(value.scalar_string()),
        });
    }
}

/// `data-*` expansion: first occurrence wins against the accumulated table.
fn insert_data(table: &mut Vec<TableEntry>, name: String, value: &AttrValue<'_>) {
    if position(table, &name).is_none() {
        table.push(TableEntry {
            key: Some(name),
            slot: Slot::Value(value.scalar_string()),
        });
    }
}

/// Joins a possibly-nested iterable value with `separator`, skipping null
/// and `false` elements. Returns `None` when nothing remains.
pub fn joined_value(value: &AttrValue<'_>, separator: &str) -> Option<String> {
    match value {
        AttrValue::List(items) => join_items(items.iter(), separator),
        AttrValue::Map(pairs) => join_items(pairs.iter().map(|(_, v)| v), separator),
        AttrValue::Null | AttrValue::Bool(false) => None,
        AttrValue::Bool(true) => Some("1".to_owned()),
        AttrValue::Int(n) => Some(n.to_string()),
        AttrValue::Str(s) => Some(s.clone().into_owned()),
    }
}

fn join_items<'a>(
    items: impl Iterator<Item = &'a AttrValue<'a>>,
    separator: &str,
) -> Option<String> {
    let mut result: Option<String> = None;
    for item in items {
        if let Some(piece) = joined_value(item, separator) {
            match result.as_mut() {
                Some(acc) => {
                    acc.push_str(separator);
                    acc.push_str(&piece);
                }
                None => result = Some(piece),
            }
        }
    }
    result
}

/// Capability the host supplies for values referenced by object-reference
/// nodes. Keeps the core free of runtime reflection: the caller decides how
/// a value exposes its type name and identity.
pub trait ObjectRef {
    /// Type name, possibly `\`-qualified (`App\Model\UserProfile`).
    fn type_name(&self) -> &str;

    /// Identity value, if the value exposes one.
    fn identity(&self) -> Option<AttrValue<'_>> {
        None
    }
}

/// Derives a CSS class name from a referenced object's type.
///
/// Returns `None` for an absent object. A given prefix is prepended with an
/// underscore.
pub fn render_object_ref_class(
    object: Option<&dyn ObjectRef>,
    prefix: Option<&str>,
) -> Option<String> {
    let object = object?;
    let slug = object_ref_class_string(object.type_name());
    Some(match prefix {
        Some(prefix) => format!("{prefix}_{slug}"),
        None => slug,
    })
}

/// Derives a DOM id (`type_identity`) from a referenced object.
///
/// An object without an identity, or with a null or `false` identity, gets
/// the literal identity `new`.
pub fn render_object_ref_id(
    object: Option<&dyn ObjectRef>,
    prefix: Option<&str>,
) -> Option<String> {
    let object = object?;
    let identity = match object.identity() {
        None | Some(AttrValue::Null) | Some(AttrValue::Bool(false)) => Cow::Borrowed("new"),
        Some(value) => Cow::Owned(value.scalar_string()),
    };
    let id = format!(
        "{}_{}",
        object_ref_class_string(object.type_name()),
        identity
    );
    Some(match prefix {
        Some(prefix) => format!("{prefix}_{id}"),
        None => id,
    })
}

/// Camel-case to snake-case transform of an unqualified type name.
///
/// Strips any `\`-qualified namespace, inserts an underscore before an
/// uppercase run that follows a lowercase letter, then lowercases.
pub fn object_ref_class_string(class: &str) -> String {
    let class = class.rsplit('\\').next().unwrap_or(class);
    let mut slug = String::with_capacity(class.len() + 4);
    let mut prev_lower = false;
    for c in class.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            slug.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
        slug.push(c.to_ascii_lowercase());
    }
    slug
}
