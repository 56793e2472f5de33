//! RDF format helpers: media type resolution, parsing and serialization.

use oxigraph::{
    io::{RdfFormat, RdfParser, RdfSerializer},
    model::{NamedNode, Quad, Triple},
};

use crate::error::{Result, TripleStoreError};

/// Resolves a declared serialization format (a MIME type such as
/// `text/turtle; charset=utf-8`) or a file extension (`ttl`, `nq`).
pub fn resolve_format(declared: &str) -> Result<RdfFormat> {
    let media_type = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    RdfFormat::from_media_type(&media_type)
        .or_else(|| RdfFormat::from_extension(&media_type))
        .ok_or_else(|| TripleStoreError::UnsupportedFormat(declared.to_string()))
}

/// Parses a payload into triples. Quads from dataset formats are flattened
/// into the default graph.
///
/// On failure the parser's own message is returned unchanged.
pub fn parse_triples(data: &[u8], format: RdfFormat) -> std::result::Result<Vec<Triple>, String> {
    RdfParser::from_format(format)
        .for_reader(data)
        .map(|parsed| {
            parsed
                .map(|quad| Triple::new(quad.subject, quad.predicate, quad.object))
                .map_err(|e| e.to_string())
        })
        .collect()
}

/// Parses N-Triples lines as produced by `TripleStoreBackend::construct`.
pub(crate) fn parse_ntriples_lines(lines: &str) -> Result<Vec<Triple>> {
    parse_triples(lines.as_bytes(), RdfFormat::NTriples).map_err(|reason| {
        TripleStoreError::ParseError {
            reason: format!("Failed to parse CONSTRUCT result: {reason}"),
        }
    })
}

/// Serializes triples in the given format. Dataset formats put them in the
/// default graph.
pub fn serialize_triples<'a>(
    triples: impl IntoIterator<Item = &'a Triple>,
    format: RdfFormat,
) -> Result<Vec<u8>> {
    let mut serializer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for triple in triples {
        serializer.serialize_triple(triple.as_ref())?;
    }
    Ok(serializer.finish()?)
}

/// Serializes quads in a dataset format (TriG, N-Quads).
pub fn serialize_quads<'a>(
    quads: impl IntoIterator<Item = &'a Quad>,
    format: RdfFormat,
) -> Result<Vec<u8>> {
    if !format.supports_datasets() {
        return Err(TripleStoreError::UnsupportedFormat(format!(
            "{} cannot carry named graphs",
            format.media_type()
        )));
    }
    let mut serializer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for quad in quads {
        serializer.serialize_quad(quad.as_ref())?;
    }
    Ok(serializer.finish()?)
}

/// Validates an IRI before it is embedded in a SPARQL string.
pub fn named_node(iri: &str) -> Result<NamedNode> {
    NamedNode::new(iri).map_err(|e| TripleStoreError::InvalidQuery {
        reason: format!("Invalid IRI '{iri}': {e}"),
    })
}

/// Renders a triple as an N-Triples statement line (`<s> <p> <o> .`).
pub fn statement_line(triple: &Triple) -> String {
    format!("{} {} {} .", triple.subject, triple.predicate, triple.object)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const TURTLE: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:a ex:p ex:b ;
             ex:label "A"@en .
    "#;

    #[test]
    fn resolves_media_types_and_extensions() {
        assert_eq!(resolve_format("text/turtle").unwrap(), RdfFormat::Turtle);
        assert_eq!(
            resolve_format("text/turtle; charset=utf-8").unwrap(),
            RdfFormat::Turtle
        );
        assert_eq!(
            resolve_format("application/n-quads").unwrap(),
            RdfFormat::NQuads
        );
        assert_eq!(resolve_format("ttl").unwrap(), RdfFormat::Turtle);
        assert!(matches!(
            resolve_format("application/x-unknown"),
            Err(TripleStoreError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parses_turtle() {
        let triples = parse_triples(TURTLE.as_bytes(), RdfFormat::Turtle).unwrap();
        assert_eq!(triples.len(), 2);
    }

    #[test]
    fn parse_error_is_reported_verbatim() {
        let error = parse_triples(b"<http://example.org/a> <http://example.org/p> .", RdfFormat::NTriples)
            .unwrap_err();
        assert!(!error.is_empty());
    }

    #[test]
    fn serialize_then_parse_keeps_statements() {
        let triples = parse_triples(TURTLE.as_bytes(), RdfFormat::Turtle).unwrap();
        let bytes = serialize_triples(&triples, RdfFormat::NTriples).unwrap();
        let reparsed = parse_triples(&bytes, RdfFormat::NTriples).unwrap();

        let expected: std::collections::HashSet<_> = triples.into_iter().collect();
        let actual: std::collections::HashSet<_> = reparsed.into_iter().collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn quads_require_dataset_format() {
        assert!(matches!(
            serialize_quads(&[], RdfFormat::Turtle),
            Err(TripleStoreError::UnsupportedFormat(_))
        ));
        assert!(serialize_quads(&[], RdfFormat::NQuads).unwrap().is_empty());
    }

    #[test]
    fn rejects_iri_with_spaces() {
        assert!(named_node("http://example.org/has space").is_err());
        assert!(named_node("http://example.org/ok").is_ok());
    }
}
