//! Synthetic PDFs for tests, built directly from lopdf objects.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

pub enum OutlineTarget {
    Page(u32),
    Named(&'static str, u32),
    Action(u32),
    Unresolved,
}

pub struct OutlineSpec {
    pub title: String,
    pub target: OutlineTarget,
    pub children: Vec<OutlineSpec>,
}

impl OutlineSpec {
    pub fn page(title: &str, page: u32) -> Self {
        Self::with_target(title, OutlineTarget::Page(page))
    }

    pub fn named(title: &str, name: &'static str, page: u32) -> Self {
        Self::with_target(title, OutlineTarget::Named(name, page))
    }

    pub fn action(title: &str, page: u32) -> Self {
        Self::with_target(title, OutlineTarget::Action(page))
    }

    pub fn unresolved(title: &str) -> Self {
        Self::with_target(title, OutlineTarget::Unresolved)
    }

    pub fn with_children(mut self, children: Vec<OutlineSpec>) -> Self {
        self.children = children;
        self
    }

    fn with_target(title: &str, target: OutlineTarget) -> Self {
        Self {
            title: title.to_string(),
            target,
            children: Vec::new(),
        }
    }
}

pub struct PdfFixture {
    pages: Vec<String>,
    outline: Vec<OutlineSpec>,
    title: Option<String>,
    file_name: String,
}

impl PdfFixture {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|page| page.to_string()).collect(),
            outline: Vec::new(),
            title: None,
            file_name: "fixture.pdf".to_string(),
        }
    }

    pub fn outline(mut self, outline: Vec<OutlineSpec>) -> Self {
        self.outline = outline;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn write(self, dir: &Path) -> PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids = Vec::with_capacity(self.pages.len());
        for text in &self.pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            text.as_bytes().to_vec(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let encoded = content.encode().expect("content stream should encode");
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id);
        }

        let kids = page_ids
            .iter()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<Object>>();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => i64::try_from(page_ids.len()).expect("page count fits i64"),
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };

        if !self.outline.is_empty() {
            let outlines_id = doc.new_object_id();
            let mut named = Dictionary::new();
            let (first, last) = add_outline_items(
                &mut doc,
                &self.outline,
                outlines_id,
                &page_ids,
                &mut named,
            )
            .expect("outline has at least one item");
            doc.objects.insert(
                outlines_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Outlines",
                    "First" => first,
                    "Last" => last,
                    "Count" => i64::try_from(self.outline.len()).expect("count fits i64"),
                }),
            );
            catalog.set("Outlines", outlines_id);
            if !named.is_empty() {
                catalog.set("Dests", doc.add_object(named));
            }
        }

        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
            });
            doc.trailer.set("Info", info_id);
        }

        let path = dir.join(&self.file_name);
        doc.save(&path).expect("fixture PDF should save");
        path
    }
}

fn page_destination(page_ids: &[ObjectId], page: u32) -> Object {
    let index = usize::try_from(page.saturating_sub(1)).expect("page index fits usize");
    Object::Array(vec![
        Object::Reference(page_ids[index]),
        Object::Name(b"Fit".to_vec()),
    ])
}

fn add_outline_items(
    doc: &mut Document,
    items: &[OutlineSpec],
    parent: ObjectId,
    page_ids: &[ObjectId],
    named: &mut Dictionary,
) -> Option<(ObjectId, ObjectId)> {
    let ids = items
        .iter()
        .map(|_| doc.new_object_id())
        .collect::<Vec<ObjectId>>();

    for (index, item) in items.iter().enumerate() {
        let mut dict = dictionary! {
            "Title" => Object::string_literal(item.title.as_str()),
            "Parent" => parent,
        };

        match item.target {
            OutlineTarget::Page(page) => dict.set("Dest", page_destination(page_ids, page)),
            OutlineTarget::Named(name, page) => {
                named.set(name, page_destination(page_ids, page));
                dict.set("Dest", Object::Name(name.as_bytes().to_vec()));
            }
            OutlineTarget::Action(page) => dict.set(
                "A",
                dictionary! {
                    "S" => "GoTo",
                    "D" => page_destination(page_ids, page),
                },
            ),
            OutlineTarget::Unresolved => {}
        }

        if index > 0 {
            dict.set("Prev", ids[index - 1]);
        }
        if index + 1 < ids.len() {
            dict.set("Next", ids[index + 1]);
        }
        if let Some((first, last)) =
            add_outline_items(doc, &item.children, ids[index], page_ids, named)
        {
            dict.set("First", first);
            dict.set("Last", last);
            dict.set(
                "Count",
                i64::try_from(item.children.len()).expect("count fits i64"),
            );
        }

        doc.objects.insert(ids[index], Object::Dictionary(dict));
    }

    Some((*ids.first()?, *ids.last()?))
}
