//! Handler signature classification
//!
//! Handlers declare their parameter list explicitly through [`Signature`].
//! At registration the signature is classified once into a
//! [`HandlerDescriptor`], which the argument resolver consults on every
//! request without touching the signature again.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use super::types::HttpMethod;

/// Parameter name that receives the raw request object
pub const REQUEST_PARAM: &str = "request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Ordinary parameter, may be supplied by position
    Positional,
    /// Variadic positional catch-all
    VarPositional,
    /// Must be supplied by name
    KeywordOnly,
    /// Open-ended keyword catch-all
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub has_default: bool,
}

/// Declared parameter list of a handler, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: impl Into<String>, kind: ParamKind, has_default: bool) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
            has_default,
        });
        self
    }

    pub fn positional(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Positional, false)
    }

    /// Shorthand for a positional `request` parameter
    pub fn request(self) -> Self {
        self.positional(REQUEST_PARAM)
    }

    pub fn var_positional(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::VarPositional, false)
    }

    /// Keyword-only parameter without a default (required)
    pub fn keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::KeywordOnly, false)
    }

    /// Keyword-only parameter with a default (optional)
    pub fn keyword_or_default(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::KeywordOnly, true)
    }

    pub fn var_keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::VarKeyword, false)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|param| param.name.as_str())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = Vec::with_capacity(self.params.len() + 1);
        let mut star_emitted = false;
        for param in &self.params {
            match param.kind {
                ParamKind::Positional => rendered.push(param.name.clone()),
                ParamKind::VarPositional => {
                    star_emitted = true;
                    rendered.push(format!("*{}", param.name));
                }
                ParamKind::KeywordOnly => {
                    if !star_emitted {
                        star_emitted = true;
                        rendered.push("*".to_string());
                    }
                    if param.has_default {
                        rendered.push(format!("{}=..", param.name));
                    } else {
                        rendered.push(param.name.clone());
                    }
                }
                ParamKind::VarKeyword => rendered.push(format!("**{}", param.name)),
            }
        }
        write!(f, "({})", rendered.join(", "))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("request parameter must be the last named parameter in function: {handler}{signature}")]
    RequestNotLast { handler: String, signature: String },

    #[error("duplicate parameter '{param}' in function: {handler}")]
    DuplicateParameter { handler: String, param: String },

    #[error("more than one {kind} catch-all in function: {handler}")]
    DuplicateCatchAll { handler: String, kind: &'static str },
}

/// Parameter requirements derived from a [`Signature`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub accepts_request: bool,
    pub accepts_arbitrary_keywords: bool,
    /// Keyword-only parameter names, excluding `request`
    pub named_parameters: Vec<String>,
    /// Named parameters without a default
    pub required_parameters: Vec<String>,
}

/// Classifies a handler's parameters.
///
/// Fails when an ordinary parameter follows `request`; only catch-alls and
/// keyword-only parameters may come after it.
pub fn classify(handler: &str, signature: &Signature) -> Result<Classification, SignatureError> {
    let mut seen = HashSet::new();
    let mut var_positional = false;
    let mut classification = Classification::default();

    for param in signature.params() {
        if !seen.insert(param.name.as_str()) {
            return Err(SignatureError::DuplicateParameter {
                handler: handler.to_string(),
                param: param.name.clone(),
            });
        }

        if classification.accepts_request && param.kind == ParamKind::Positional {
            return Err(SignatureError::RequestNotLast {
                handler: handler.to_string(),
                signature: signature.to_string(),
            });
        }

        if param.name == REQUEST_PARAM {
            classification.accepts_request = true;
            // `*request` and `**request` still count as catch-alls
            if matches!(param.kind, ParamKind::Positional | ParamKind::KeywordOnly) {
                continue;
            }
        }

        match param.kind {
            ParamKind::Positional => {}
            ParamKind::VarPositional => {
                if var_positional {
                    return Err(SignatureError::DuplicateCatchAll {
                        handler: handler.to_string(),
                        kind: "positional",
                    });
                }
                var_positional = true;
            }
            ParamKind::KeywordOnly => {
                classification.named_parameters.push(param.name.clone());
                if !param.has_default {
                    classification.required_parameters.push(param.name.clone());
                }
            }
            ParamKind::VarKeyword => {
                if classification.accepts_arbitrary_keywords {
                    return Err(SignatureError::DuplicateCatchAll {
                        handler: handler.to_string(),
                        kind: "keyword",
                    });
                }
                classification.accepts_arbitrary_keywords = true;
            }
        }
    }

    Ok(classification)
}

/// Immutable per-route view of a handler's requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    method: HttpMethod,
    path: String,
    classification: Classification,
}

impl HandlerDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>, classification: Classification) -> Self {
        Self {
            method,
            path: path.into(),
            classification,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn accepts_request(&self) -> bool {
        self.classification.accepts_request
    }

    pub fn accepts_arbitrary_keywords(&self) -> bool {
        self.classification.accepts_arbitrary_keywords
    }

    pub fn named_parameters(&self) -> &[String] {
        &self.classification.named_parameters
    }

    pub fn required_parameters(&self) -> &[String] {
        &self.classification.required_parameters
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.classification
            .named_parameters
            .iter()
            .any(|named| named == name)
    }

    /// Whether the request body or query string has to be looked at at all
    pub fn needs_parsing(&self) -> bool {
        self.accepts_request()
            || self.accepts_arbitrary_keywords()
            || !self.named_parameters().is_empty()
    }
}
