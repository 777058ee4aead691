//! PDF builders for tests. Every page draws a single `page-NNN` label so
//! extracted documents can be checked for order and completeness.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub fn page_label(number: u32) -> String {
    format!("page-{:03}", number)
}

pub fn sample_pdf(num_pages: u32) -> Vec<u8> {
    nested_pdf(num_pages, 0)
}

/// Builds a page tree where pages are grouped under intermediate `Pages`
/// nodes of `fanout` kids. Each intermediate node carries `Rotate 90` and the
/// root carries `MediaBox` and `Resources`, so pages inherit all three.
/// A `fanout` of 0 puts every page directly under the root.
pub fn nested_pdf(num_pages: u32, fanout: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let root_pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let numbers = (1..=num_pages).collect::<Vec<_>>();
    let flat = fanout == 0 || fanout >= num_pages;
    let group_size = if flat {
        numbers.len().max(1)
    } else {
        fanout as usize
    };

    let mut root_kids = Vec::new();
    for group in numbers.chunks(group_size) {
        let parent_id = if flat {
            root_pages_id
        } else {
            doc.new_object_id()
        };

        let kids = group
            .iter()
            .map(|&number| Object::Reference(add_page(&mut doc, parent_id, number)))
            .collect::<Vec<_>>();

        if flat {
            root_kids.extend(kids);
        } else {
            doc.objects.insert(
                parent_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Pages",
                    "Parent" => root_pages_id,
                    "Kids" => kids,
                    "Count" => group.len() as i64,
                    "Rotate" => 90_i64,
                }),
            );
            root_kids.push(Object::Reference(parent_id));
        }
    }

    doc.objects.insert(
        root_pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => root_kids,
            "Count" => num_pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => root_pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("fixture PDF should serialize");
    buffer
}

/// Labels drawn on each page of `bytes`, in page-tree order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("PDF should parse");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let raw = doc
                .get_page_content(page_id)
                .expect("page should have content");
            let content = Content::decode(&raw).expect("content stream should decode");
            content
                .operations
                .iter()
                .filter(|operation| operation.operator == "Tj")
                .filter_map(|operation| operation.operands.first())
                .filter_map(|operand| operand.as_str().ok())
                .map(|text| String::from_utf8_lossy(text).into_owned())
                .collect::<String>()
        })
        .collect()
}

fn add_page(doc: &mut Document, parent_id: ObjectId, number: u32) -> ObjectId {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    page_label(number).into_bytes(),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("content should encode"),
    ));

    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent_id,
        "Contents" => content_id,
    })
}
