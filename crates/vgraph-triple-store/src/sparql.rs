use std::collections::{HashMap, HashSet};

use oxigraph::model::{BlankNode, Literal, NamedNode, Term};
use serde::Deserialize;

use crate::error::{Result, TripleStoreError};

#[derive(Deserialize)]
struct SparqlSelectResponse {
    results: SparqlSelectResults,
}

#[derive(Deserialize)]
struct SparqlSelectResults {
    bindings: Vec<HashMap<String, SparqlSelectBinding>>,
}

#[derive(Deserialize)]
struct SparqlSelectBinding {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    datatype: Option<String>,
    #[serde(rename = "xml:lang")]
    language: Option<String>,
}

impl SparqlSelectBinding {
    fn into_term(self) -> Result<Term> {
        let term = match self.kind.as_str() {
            "uri" => Term::NamedNode(NamedNode::new(self.value).map_err(|e| {
                TripleStoreError::ParseError {
                    reason: format!("Invalid IRI in SELECT response: {e}"),
                }
            })?),
            "bnode" => Term::BlankNode(BlankNode::new(self.value).map_err(|e| {
                TripleStoreError::ParseError {
                    reason: format!("Invalid blank node in SELECT response: {e}"),
                }
            })?),
            "literal" | "typed-literal" => match (self.language, self.datatype) {
                (Some(language), _) => Term::Literal(
                    Literal::new_language_tagged_literal(self.value, language).map_err(|e| {
                        TripleStoreError::ParseError {
                            reason: format!("Invalid language tag in SELECT response: {e}"),
                        }
                    })?,
                ),
                (None, Some(datatype)) => {
                    let datatype =
                        NamedNode::new(datatype).map_err(|e| TripleStoreError::ParseError {
                            reason: format!("Invalid datatype in SELECT response: {e}"),
                        })?;
                    Term::Literal(Literal::new_typed_literal(self.value, datatype))
                }
                (None, None) => Term::Literal(Literal::new_simple_literal(self.value)),
            },
            other => {
                return Err(TripleStoreError::ParseError {
                    reason: format!("Unknown binding type in SELECT response: {other}"),
                });
            }
        };
        Ok(term)
    }
}

fn parse_response(json: &str) -> Result<SparqlSelectResponse> {
    serde_json::from_str(json).map_err(|e| TripleStoreError::ParseError {
        reason: format!("Failed to parse SELECT response: {e}"),
    })
}

/// Lexical values bound to `var`, unordered.
pub(crate) fn parse_select_values(json: &str, var: &str) -> Result<HashSet<String>> {
    let response = parse_response(json)?;

    let mut values = HashSet::new();
    for binding in response.results.bindings {
        if let Some(value) = binding.get(var) {
            values.insert(value.value.clone());
        }
    }

    Ok(values)
}

/// Every solution row as typed terms, in response order.
pub(crate) fn parse_select_rows(json: &str) -> Result<Vec<HashMap<String, Term>>> {
    let response = parse_response(json)?;

    response
        .results
        .bindings
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(var, binding)| Ok((var, binding.into_term()?)))
                .collect::<Result<HashMap<_, _>>>()
        })
        .collect()
}

/// Integer bound to `var` in the first row (aggregate queries).
pub(crate) fn parse_select_count(json: &str, var: &str) -> Result<usize> {
    let response = parse_response(json)?;

    let Some(binding) = response
        .results
        .bindings
        .into_iter()
        .next()
        .and_then(|mut row| row.remove(var))
    else {
        return Ok(0);
    };

    binding
        .value
        .parse::<usize>()
        .map_err(|e| TripleStoreError::ParseError {
            reason: format!("Invalid count '{}' in SELECT response: {e}", binding.value),
        })
}
