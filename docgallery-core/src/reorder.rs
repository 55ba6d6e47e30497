use crate::model::Document;

/// Removes the item at `from` and reinserts it at `to`. Every other item
/// keeps its relative order. Out of range indices leave the sequence as is.
pub fn array_move<T>(mut items: Vec<T>, from: usize, to: usize) -> Vec<T> {
    if from >= items.len() || to >= items.len() || from == to {
        return items;
    }
    let item = items.remove(from);
    items.insert(to, item);
    items
}

/// Rewrites every position to the document's index.
pub fn reindex(documents: Vec<Document>) -> Vec<Document> {
    documents
        .into_iter()
        .enumerate()
        .map(|(index, doc)| Document {
            position: index as i64,
            ..doc
        })
        .collect()
}

pub fn move_document(documents: Vec<Document>, from: usize, to: usize) -> Vec<Document> {
    reindex(array_move(documents, from, to))
}
