//! Atom feed parsing for arXiv search responses.
//!
//! The parser walks the document with a namespace-aware `quick-xml` reader and
//! only looks at direct children in the Atom namespace: `entry` under the
//! root, and `title`, `summary`, `published`, `id` and `author/name` under each
//! entry. Anything else is skipped. Missing or blank fields fall back to the
//! defaults on [`PaperRecord`]; only a document that is not well-formed fails.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::ShelfError;
use crate::models::PaperRecord;

/// Atom syndication namespace
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

const ENTRY_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;
const AUTHOR_NAME_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Published,
    Id,
    AuthorName,
}

/// Raw text collected for one entry before normalization
#[derive(Debug, Default)]
struct EntryFields {
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    id: Option<String>,
    authors: Vec<String>,
}

impl EntryFields {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Published => &mut self.published,
            Field::Id => &mut self.id,
            Field::AuthorName => return,
        };
        // First occurrence wins
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn into_record(self) -> PaperRecord {
        let mut record = PaperRecord::default();

        if let Some(title) = non_blank(self.title) {
            record.title = normalize_title(&title);
        }
        if !self.authors.is_empty() {
            record.authors = self.authors.join(", ");
        }
        if let Some(summary) = non_blank(self.summary) {
            record.summary = summary.trim().to_string();
        }
        if let Some(published) = non_blank(self.published) {
            record.published = published.trim().chars().take(10).collect();
        }
        if let Some(id) = self.id {
            record.set_identifier(&id);
        }

        record
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Collapse each newline, together with the indentation around it, into a
/// single space and trim the ends.
pub fn normalize_title(title: &str) -> String {
    title
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_atom(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS.as_bytes())
}

/// Reject unbound prefixes and malformed or duplicated attributes
fn check_element(ns: &ResolveResult, element: &BytesStart) -> Result<(), ShelfError> {
    if let ResolveResult::Unknown(prefix) = ns {
        return Err(ShelfError::ParseFailed(format!(
            "unbound namespace prefix `{}`",
            String::from_utf8_lossy(prefix)
        )));
    }
    for attr in element.attributes() {
        attr.map_err(|e| ShelfError::ParseFailed(format!("invalid attribute: {}", e)))?;
    }
    Ok(())
}

fn field_for(local_name: &[u8]) -> Option<Field> {
    match local_name {
        b"title" => Some(Field::Title),
        b"summary" => Some(Field::Summary),
        b"published" => Some(Field::Published),
        b"id" => Some(Field::Id),
        _ => None,
    }
}

/// Parse an Atom feed into paper records, in document order.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<PaperRecord>, ShelfError> {
    let mut reader = NsReader::from_reader(xml);

    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    let mut entry: Option<EntryFields> = None;
    let mut in_author = false;
    let mut author_name: Option<String> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let atom = is_atom(&ns);

        match event {
            Event::Start(e) => {
                check_element(&ns, &e)?;
                if depth == 0 {
                    if seen_root {
                        return Err(ShelfError::ParseFailed(
                            "multiple root elements".to_string(),
                        ));
                    }
                    seen_root = true;
                }
                depth += 1;

                if !atom {
                    continue;
                }
                let local = e.local_name();
                match depth {
                    ENTRY_DEPTH if local.as_ref() == b"entry" => {
                        entry = Some(EntryFields::default());
                    }
                    FIELD_DEPTH if entry.is_some() => {
                        if local.as_ref() == b"author" {
                            in_author = true;
                            author_name = None;
                        } else if let Some(f) = field_for(local.as_ref()) {
                            field = Some(f);
                            text.clear();
                        }
                    }
                    AUTHOR_NAME_DEPTH if in_author && local.as_ref() == b"name" => {
                        field = Some(Field::AuthorName);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                check_element(&ns, &e)?;
                if depth == 0 {
                    if seen_root {
                        return Err(ShelfError::ParseFailed(
                            "multiple root elements".to_string(),
                        ));
                    }
                    seen_root = true;
                    continue;
                }
                // A self-closing entry has no children, so every field defaults
                if atom && depth + 1 == ENTRY_DEPTH && e.local_name().as_ref() == b"entry" {
                    records.push(PaperRecord::default());
                }
            }
            Event::Text(t) => {
                let chunk = t.unescape()?;
                if depth == 0 {
                    if !chunk.trim().is_empty() {
                        return Err(ShelfError::ParseFailed(
                            "text content outside the root element".to_string(),
                        ));
                    }
                } else if field.is_some() && collecting_at(field, depth) {
                    text.push_str(&chunk);
                }
            }
            Event::CData(c) => {
                if depth == 0 {
                    return Err(ShelfError::ParseFailed(
                        "CDATA outside the root element".to_string(),
                    ));
                }
                if field.is_some() && collecting_at(field, depth) {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(ShelfError::ParseFailed("unmatched end tag".to_string()));
                }

                if let Some(f) = field {
                    if collecting_at(Some(f), depth) {
                        let value = std::mem::take(&mut text);
                        match f {
                            Field::AuthorName => {
                                if author_name.is_none() && !value.trim().is_empty() {
                                    author_name = Some(value.trim().to_string());
                                }
                            }
                            _ => {
                                if let Some(fields) = entry.as_mut() {
                                    fields.set(f, value);
                                }
                            }
                        }
                        field = None;
                    }
                }

                if depth == FIELD_DEPTH && in_author {
                    in_author = false;
                    if let (Some(fields), Some(name)) = (entry.as_mut(), author_name.take()) {
                        fields.authors.push(name);
                    }
                }

                if depth == ENTRY_DEPTH {
                    if let Some(fields) = entry.take() {
                        records.push(fields.into_record());
                    }
                }

                depth -= 1;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
    }

    if !seen_root {
        return Err(ShelfError::ParseFailed(
            "document has no root element".to_string(),
        ));
    }
    if depth != 0 {
        return Err(ShelfError::ParseFailed(
            "unexpected end of document".to_string(),
        ));
    }

    tracing::debug!(count = records.len(), "Parsed feed entries");
    Ok(records)
}

/// Whether text at `depth` belongs directly to the open field element
fn collecting_at(field: Option<Field>, depth: usize) -> bool {
    match field {
        Some(Field::AuthorName) => depth == AUTHOR_NAME_DEPTH,
        Some(_) => depth == FIELD_DEPTH,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:electron</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
  You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
recurrent networks.
</summary>
    <author>
      <name>Ashish Vaswani</name>
      <arxiv:affiliation>Google Brain</arxiv:affiliation>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/hep-ex/0307015v1</id>
    <published>2003-07-07T13:46:39-04:00</published>
    <title>Multi-Electron Production at High Transverse Momenta</title>
    <summary>Electron production &amp; more.</summary>
    <author><name>H1 Collaboration</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_entries_in_order() {
        let records = parse_feed(TWO_ENTRIES.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Attention Is All You Need");
        assert_eq!(first.authors, "Ashish Vaswani, Noam Shazeer");
        assert_eq!(
            first.summary,
            "The dominant sequence transduction models are based on complex\nrecurrent networks."
        );
        assert_eq!(first.published, "2017-06-12");
        assert_eq!(first.arxiv_id, "1706.03762v7");
        assert_eq!(first.arxiv_url, "http://arxiv.org/abs/1706.03762v7");

        let second = &records[1];
        assert_eq!(second.title, "Multi-Electron Production at High Transverse Momenta");
        assert_eq!(second.summary, "Electron production & more.");
        assert_eq!(second.arxiv_id, "0307015v1");
        assert_eq!(second.published, "2003-07-07");
    }

    #[test]
    fn test_feed_level_title_and_id_ignored() {
        let records = parse_feed(TWO_ENTRIES.as_bytes()).unwrap();
        assert!(records.iter().all(|r| !r.title.starts_with("ArXiv Query")));
        assert!(records.iter().all(|r| !r.arxiv_url.contains("/api/")));
    }

    #[test]
    fn test_entry_without_children_is_all_defaults() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry></entry><entry/></feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records, vec![PaperRecord::default(), PaperRecord::default()]);
    }

    #[test]
    fn test_blank_fields_use_defaults() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry>
                <title>   </title>
                <summary/>
                <published></published>
                <id> </id>
                <author><name>  </name></author>
            </entry>
        </feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records, vec![PaperRecord::default()]);
    }

    #[test]
    fn test_every_field_populated() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><title>Only a title</title></entry>
            <entry><author><name>Only An Author</name></author></entry>
            <entry><id>http://arxiv.org/abs/2401.00001v1</id></entry>
        </feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            for value in [
                &record.title,
                &record.authors,
                &record.summary,
                &record.published,
                &record.arxiv_id,
                &record.arxiv_url,
            ] {
                assert!(!value.is_empty());
            }
        }
        assert_eq!(records[1].authors, "Only An Author");
        assert_eq!(records[2].arxiv_id, "2401.00001v1");
    }

    #[test]
    fn test_prefixed_atom_namespace() {
        let xml = r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom">
            <atom:entry><atom:title>Prefixed</atom:title></atom:entry>
        </atom:feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Prefixed");
    }

    #[test]
    fn test_elements_outside_atom_namespace_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:x="urn:other">
            <x:entry><x:title>Foreign</x:title></x:entry>
            <entry><x:title>Foreign title</x:title></entry>
        </feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "No title available");
    }

    #[test]
    fn test_unqualified_feed_yields_no_records() {
        let xml = "<feed><entry><title>No namespace</title></entry></feed>";
        assert!(parse_feed(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_cdata_title() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><title><![CDATA[Graphs <and> Trees]]></title></entry>
        </feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records[0].title, "Graphs <and> Trees");
    }

    #[test]
    fn test_non_xml_fails() {
        let err = parse_feed(b"this is not xml at all").unwrap_err();
        assert!(matches!(err, ShelfError::ParseFailed(_)));
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(matches!(parse_feed(b""), Err(ShelfError::ParseFailed(_))));
    }

    #[test]
    fn test_truncated_payload_fails() {
        let truncated = &TWO_ENTRIES[..TWO_ENTRIES.len() / 2];
        assert!(matches!(
            parse_feed(truncated.as_bytes()),
            Err(ShelfError::ParseFailed(_))
        ));
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry></feed></entry>"#;
        assert!(matches!(
            parse_feed(xml.as_bytes()),
            Err(ShelfError::ParseFailed(_))
        ));
    }

    fn assert_parse_failed(xml: &str) {
        match parse_feed(xml.as_bytes()) {
            Err(ShelfError::ParseFailed(_)) => {}
            other => panic!("expected a parse failure for {xml}, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_attribute_fails() {
        assert_parse_failed(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" a="1" a="2"><entry/></feed>"#,
        );
    }

    #[test]
    fn test_unquoted_attribute_fails() {
        assert_parse_failed(r#"<feed xmlns="http://www.w3.org/2005/Atom" a=b><entry/></feed>"#);
    }

    #[test]
    fn test_attribute_without_value_fails() {
        assert_parse_failed(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry junk></entry></feed>"#,
        );
    }

    #[test]
    fn test_unbound_prefix_fails() {
        assert_parse_failed(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><x:title>T</x:title></entry></feed>"#,
        );
    }

    #[test]
    fn test_attributes_on_fields_accepted() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><title type="text">Typed</title><link href="http://arxiv.org/abs/1" rel="alternate"/></entry>
        </feed>"#;
        let records = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(records[0].title, "Typed");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  A\n  B\r\n C  "), "A B C");
        assert_eq!(normalize_title("Single line"), "Single line");
    }
}
