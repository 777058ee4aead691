use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pagesplit_core::ChunkRange;

use crate::error::DocumentError;
use crate::partition::PageSource;

// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A parsed PDF held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    inner: Document,
    page_count: u32,
}

impl PdfDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let inner = Document::load_mem(bytes)
            .map_err(|error| DocumentError::Unparseable(error.to_string()))?;

        if inner.is_encrypted() {
            return Err(DocumentError::Encrypted);
        }

        let page_count = u32::try_from(inner.get_pages().len())
            .map_err(|_| DocumentError::Unparseable("page tree is too large".to_string()))?;

        Ok(Self { inner, page_count })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Builds a standalone document holding pages `range` of this one.
    ///
    /// The page tree is flattened under the original root node, with
    /// inherited attributes pinned onto each page so nothing visible changes.
    /// The part gets a fresh catalog, and annotations linking to pages
    /// outside the range are dropped, so only objects reachable from the
    /// kept pages survive pruning.
    pub fn extract_range(&self, range: ChunkRange) -> Result<Vec<u8>, DocumentError> {
        let pages = self.inner.get_pages();
        let selected = range
            .page_numbers()
            .map(|page| {
                pages
                    .get(&page)
                    .copied()
                    .ok_or(DocumentError::MissingPage { page })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut doc = self.inner.clone();
        let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
        let root_pages_id = doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?;

        for &page_id in &selected {
            let inherited = inherited_attributes(&doc, page_id, root_pages_id)?;
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            for (key, value) in inherited {
                page.set(key, value);
            }
            page.set("Parent", root_pages_id);
        }

        let root_pages = doc.get_object_mut(root_pages_id)?.as_dict_mut()?;
        root_pages.set(
            "Kids",
            selected
                .iter()
                .map(|&page_id| Object::Reference(page_id))
                .collect::<Vec<_>>(),
        );
        root_pages.set("Count", selected.len() as i64);

        let dropped = pages
            .values()
            .copied()
            .filter(|page_id| !selected.contains(page_id))
            .collect::<HashSet<_>>();
        for &page_id in &selected {
            prune_page_links(&mut doc, page_id, &dropped)?;
        }

        // The source catalog reaches every page through its structure tree
        // and actions, so the part gets a bare one.
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", root_pages_id);
        if let Ok(lang) = doc.get_dictionary(catalog_id)?.get(b"Lang") {
            catalog.set("Lang", lang.clone());
        }
        doc.objects.insert(catalog_id, Object::Dictionary(catalog));

        let info = doc.trailer.get(b"Info").ok().cloned();
        doc.trailer = Dictionary::new();
        doc.trailer.set("Root", catalog_id);
        if let Some(info) = info {
            doc.trailer.set("Info", info);
        }

        doc.prune_objects();

        let actual = doc.get_pages().len() as u32;
        if actual != range.len() {
            return Err(DocumentError::PageCount {
                expected: range.len(),
                actual,
            });
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|error| DocumentError::Serialize(error.to_string()))?;
        Ok(buffer)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn extract(&self, range: ChunkRange) -> Result<Vec<u8>, DocumentError> {
        self.extract_range(range)
    }
}

/// Collects inheritable attributes the page does not set itself, taking the
/// nearest ancestor's value. The root node is skipped since it stays the
/// page's parent.
fn inherited_attributes(
    doc: &Document,
    page_id: ObjectId,
    root_pages_id: ObjectId,
) -> Result<Vec<(Vec<u8>, Object)>, DocumentError> {
    let page = doc.get_dictionary(page_id)?;
    let mut missing = INHERITABLE_KEYS
        .iter()
        .filter(|key| !page.has(key))
        .copied()
        .collect::<Vec<_>>();
    let mut found = Vec::new();
    let mut visited = HashSet::new();

    let mut parent = parent_of(page);
    while let Some(node_id) = parent {
        if node_id == root_pages_id || missing.is_empty() || !visited.insert(node_id) {
            break;
        }
        let node = doc.get_dictionary(node_id)?;
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = parent_of(node);
    }

    Ok(found)
}

/// Drops annotations on `page_id` whose destination or owning page is one
/// of the `dropped` pages, along with the page's article beads.
fn prune_page_links(
    doc: &mut Document,
    page_id: ObjectId,
    dropped: &HashSet<ObjectId>,
) -> Result<(), DocumentError> {
    let annots = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Array(items)) => Some(items.clone()),
        Ok(Object::Reference(id)) => Some(doc.get_object(*id)?.as_array()?.clone()),
        _ => None,
    };

    let kept = annots.map(|items| {
        items
            .into_iter()
            .filter(|annot| !links_outside(doc, annot, dropped))
            .collect::<Vec<_>>()
    });

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.remove(b"B");
    match kept {
        Some(items) if items.is_empty() => {
            page.remove(b"Annots");
        }
        Some(items) => page.set("Annots", items),
        None => {}
    }
    Ok(())
}

fn links_outside(doc: &Document, annot: &Object, dropped: &HashSet<ObjectId>) -> bool {
    let dict = match annot {
        Object::Reference(id) => match doc.get_dictionary(*id) {
            Ok(dict) => dict,
            Err(_) => return false,
        },
        Object::Dictionary(dict) => dict,
        _ => return false,
    };

    let action_dest = dict
        .get(b"A")
        .ok()
        .and_then(|action| match action {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(action) => Some(action),
            _ => None,
        })
        .and_then(|action| action.get(b"D").ok());

    [dict.get(b"Dest").ok(), dict.get(b"P").ok(), action_dest]
        .into_iter()
        .flatten()
        .any(|target| refers_to(target, dropped))
}

// Explicit destinations are arrays that lead with the target page.
fn refers_to(target: &Object, dropped: &HashSet<ObjectId>) -> bool {
    match target {
        Object::Reference(id) => dropped.contains(id),
        Object::Array(items) => items.iter().any(|item| refers_to(item, dropped)),
        _ => false,
    }
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent")
        .and_then(Object::as_reference)
        .ok()
}
