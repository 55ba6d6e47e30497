pub const FALLBACK_THUMBNAIL: &str = "https://picsum.photos/300/200";

const THUMBNAILS: &[(&str, &str)] = &[
    ("bank-draft", "https://picsum.photos/id/1018/300/200"),
    ("bill-of-lading", "https://picsum.photos/id/1015/300/200"),
    ("invoice", "https://picsum.photos/id/1019/300/200"),
    ("bank-draft-2", "https://picsum.photos/id/1016/300/200"),
    ("bill-of-lading-2", "https://picsum.photos/id/1020/300/200"),
];

pub fn thumbnail_for(kind: &str) -> &'static str {
    THUMBNAILS
        .iter()
        .find(|(known, _)| *known == kind)
        .map_or(FALLBACK_THUMBNAIL, |&(_, url)| url)
}
