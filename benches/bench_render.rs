#![allow(clippy::unwrap_used, reason = "benchmark")]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use hamelin::{
    AttrValue, AttributeDecl, AttributeItem, Escaping, Node, RenderOptions, render,
    render_attributes,
};

fn attr<'a>(name: &'a str, value: Node<'a>) -> AttributeDecl<'a> {
    AttributeDecl {
        name: Some(Node::Text {
            content: name.into(),
        }),
        value,
    }
}

fn insert(content: &str, escaping: Escaping) -> Node<'_> {
    Node::Insert {
        content: content.into(),
        escaping,
    }
}

// A listing page: a loop over rows, each row a tag with merged attributes
// and escaped inserts.
fn page_tree() -> Node<'static> {
    let row = Node::Tag {
        name: "tr".into(),
        attributes: vec![
            attr("class", insert("$row->cssClass()", Escaping::Disabled)),
            attr(
                "id",
                Node::ObjectRefId {
                    value: Box::new(insert("$row", Escaping::Disabled)),
                    prefix: None,
                },
            ),
        ],
        children: vec![Node::Tag {
            name: "td".into(),
            attributes: vec![],
            children: vec![
                insert("$row->title", Escaping::Once),
                Node::InterpolatedString {
                    children: vec![
                        Node::Text { content: " (".into() },
                        insert("$row->count", Escaping::Repeated),
                        Node::Text { content: ")".into() },
                    ],
                },
            ],
        }],
    };

    Node::Root(vec![
        Node::Text {
            content: "<!DOCTYPE html>\n".into(),
        },
        Node::Block {
            head: "foreach ($rows as $row)".into(),
            children: vec![row, Node::Text { content: "\n".into() }],
            mids: vec![],
        },
    ])
}

fn attribute_list() -> Vec<AttributeItem<'static>> {
    vec![
        AttributeItem::pair("class", "btn"),
        AttributeItem::pair(
            "class",
            AttrValue::List(vec!["btn-primary".into(), "active".into()]),
        ),
        AttributeItem::pair(
            "data",
            AttrValue::Map(vec![
                ("toggle".into(), "modal".into()),
                ("target".into(), "#dialog".into()),
            ]),
        ),
        AttributeItem::pair("disabled", true),
        AttributeItem::pair("title", AttrValue::Null),
        AttributeItem::pair("href", "/items?page=2&sort=asc"),
    ]
}

fn codegen_benchmark(c: &mut Criterion) {
    let tree = page_tree();
    let options = RenderOptions::default();

    let mut group = c.benchmark_group("Code generation");
    group.bench_function("render_page", |b| {
        b.iter(|| black_box(render(&tree, &options).unwrap()));
    });
    group.finish();
}

fn runtime_benchmark(c: &mut Criterion) {
    let list = attribute_list();

    let mut group = c.benchmark_group("Runtime");
    group.bench_function("render_attributes", |b| {
        b.iter(|| black_box(render_attributes(&list, "html5", "UTF-8")));
    });
    group.finish();
}

criterion_group!(benches, codegen_benchmark, runtime_benchmark);
criterion_main!(benches);
