use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::ExtractError;

const MAX_NAME_TREE_DEPTH: usize = 32;
const MAX_DESTINATION_HOPS: usize = 4;

/// Per-page text access. Section extraction only needs this much of a document.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Text of the 1-based `page`.
    fn page_text(&self, page: u32) -> Result<String, ExtractError>;
}

/// A raw outline item before ids, levels and paths are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub title: String,
    /// Resolved 1-based page, `None` when the destination could not be resolved.
    pub page: Option<u32>,
    pub children: Vec<OutlineNode>,
}

/// An opened PDF. The underlying file is fully read on open and released on drop.
pub struct PdfDocument {
    path: PathBuf,
    inner: Document,
    pages: BTreeMap<u32, ObjectId>,
    page_numbers: HashMap<ObjectId, u32>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let inner = Document::load(path).map_err(|source| ExtractError::DocumentOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let pages = inner.get_pages();
        let page_numbers = pages
            .iter()
            .map(|(number, id)| (*id, *number))
            .collect::<HashMap<ObjectId, u32>>();

        debug!(path = %path.display(), pages = pages.len(), "opened document");

        Ok(Self {
            path: path.to_path_buf(),
            inner,
            pages,
            page_numbers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `/Info /Title`, whitespace-normalized, if present and non-empty.
    pub fn title(&self) -> Option<String> {
        let info = self
            .inner
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| self.resolve(info))
            .and_then(|info| info.as_dict().ok())?;
        let raw = self.get_resolved(info, b"Title")?.as_str().ok()?;
        let title = crate::util::normalize_whitespace(&decode_text_string(raw));
        (!title.is_empty()).then_some(title)
    }

    /// Outline tree in document order. Empty when the document has no outline.
    pub fn outline(&self) -> Vec<OutlineNode> {
        let Ok(catalog) = self.inner.catalog() else {
            return Vec::new();
        };
        let Some(outlines) = self
            .get_resolved(catalog, b"Outlines")
            .and_then(|outlines| outlines.as_dict().ok())
        else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        self.outline_siblings(outlines.get(b"First").ok(), &mut visited)
    }

    fn outline_siblings(
        &self,
        first: Option<&Object>,
        visited: &mut HashSet<ObjectId>,
    ) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();
        let mut current = first.and_then(|item| item.as_reference().ok());

        while let Some(item_id) = current {
            if !visited.insert(item_id) {
                warn!(
                    path = %self.path.display(),
                    object = ?item_id,
                    "outline links back to a visited item; stopping"
                );
                break;
            }
            let Ok(item) = self.inner.get_dictionary(item_id) else {
                warn!(object = ?item_id, "outline item is not a dictionary");
                break;
            };

            let title = self
                .get_resolved(item, b"Title")
                .and_then(|title| title.as_str().ok())
                .map(decode_text_string)
                .unwrap_or_default();
            let page = self.outline_item_page(item);
            let children = self.outline_siblings(item.get(b"First").ok(), visited);

            nodes.push(OutlineNode {
                title,
                page,
                children,
            });

            current = item.get(b"Next").ok().and_then(|next| next.as_reference().ok());
        }

        nodes
    }

    fn outline_item_page(&self, item: &Dictionary) -> Option<u32> {
        if let Some(dest) = self.get_resolved(item, b"Dest") {
            return self.destination_page(dest, 0);
        }

        let action = self.get_resolved(item, b"A")?.as_dict().ok()?;
        let is_goto = action
            .get(b"S")
            .and_then(Object::as_name)
            .map(|kind| kind == b"GoTo")
            .unwrap_or(false);
        if !is_goto {
            return None;
        }
        self.destination_page(self.get_resolved(action, b"D")?, 0)
    }

    fn destination_page(&self, dest: &Object, hops: usize) -> Option<u32> {
        if hops > MAX_DESTINATION_HOPS {
            return None;
        }

        match self.resolve(dest)? {
            Object::Array(items) => match items.first()? {
                Object::Reference(page_id) => self.page_numbers.get(page_id).copied(),
                Object::Integer(index) if *index >= 0 => u32::try_from(*index + 1).ok(),
                _ => None,
            },
            Object::Name(name) | Object::String(name, _) => {
                let target = self.named_destination(name)?;
                self.destination_page(target, hops + 1)
            }
            Object::Dictionary(dict) => self.destination_page(dict.get(b"D").ok()?, hops + 1),
            _ => None,
        }
    }

    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.inner.catalog().ok()?;

        if let Some(found) = self
            .get_resolved(catalog, b"Dests")
            .and_then(|dests| dests.as_dict().ok())
            .and_then(|dests| dests.get(name).ok())
        {
            return Some(found);
        }

        let tree = self
            .get_resolved(catalog, b"Names")
            .and_then(|names| names.as_dict().ok())
            .and_then(|names| self.get_resolved(names, b"Dests"))
            .and_then(|dests| dests.as_dict().ok())?;
        self.search_name_tree(tree, name, 0)
    }

    fn search_name_tree<'a>(
        &'a self,
        node: &'a Dictionary,
        name: &[u8],
        depth: usize,
    ) -> Option<&'a Object> {
        if depth > MAX_NAME_TREE_DEPTH {
            return None;
        }

        if let Some(Object::Array(names)) = self.get_resolved(node, b"Names") {
            for pair in names.chunks(2) {
                if let [key, value] = pair {
                    let matches = self
                        .resolve(key)
                        .and_then(|key| key.as_str().ok())
                        .map(|key| key == name)
                        .unwrap_or(false);
                    if matches {
                        return Some(value);
                    }
                }
            }
        }

        if let Some(Object::Array(kids)) = self.get_resolved(node, b"Kids") {
            for kid in kids {
                let found = self
                    .resolve(kid)
                    .and_then(|kid| kid.as_dict().ok())
                    .and_then(|kid| self.search_name_tree(kid, name, depth + 1));
                if found.is_some() {
                    return found;
                }
            }
        }

        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.inner.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn get_resolved<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        self.resolve(dict.get(key).ok()?)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn page_text(&self, page: u32) -> Result<String, ExtractError> {
        if !self.pages.contains_key(&page) {
            return Err(ExtractError::PageExtraction {
                page,
                reason: "page not present in page tree".to_string(),
            });
        }

        self.inner
            .extract_text(&[page])
            .map_err(|err| ExtractError::PageExtraction {
                page,
                reason: err.to_string(),
            })
    }
}

/// Decodes a PDF text string: UTF-16BE when it carries a byte-order mark,
/// UTF-8 with a BOM, otherwise one byte per character.
pub fn decode_text_string(raw: &[u8]) -> String {
    if let Some(body) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units)
            .map(|ch| ch.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    if let Some(body) = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(body).into_owned();
    }
    raw.iter().map(|&byte| char::from(byte)).collect()
}
