//! Response-shaping directives.
//!
//! Directives are declared per action in any order. [`ResponseDirectives`]
//! compiles them once into fixed slots: for every single-valued kind the
//! first declaration wins, headers accumulate in declaration order.

use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

/// Kind of a [`ResponseDirective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseHandlerType {
    /// Status for successful results.
    SuccessCode,
    /// Status for empty results.
    EmptyResultCode,
    /// Status for `null` results.
    NullResultCode,
    /// Status for undefined results.
    UndefinedResultCode,
    /// Status for errors without a status of their own.
    ErrorCode,
    /// A response header.
    Header,
    /// The `Content-Type` header.
    ContentType,
    /// The `Location` header.
    Location,
    /// Redirect target.
    Redirect,
    /// Template to render.
    RenderedTemplate,
    /// Force JSON responses.
    JsonResponse,
    /// Force text responses.
    TextResponse,
    /// Serialization options for JSON results.
    TransformOptions,
}

/// Properties removed from JSON results before they are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Property names to drop.
    pub excludes: Vec<String>,
    /// Property name prefixes to drop, e.g. `_`.
    pub exclude_prefixes: Vec<String>,
}

impl TransformOptions {
    /// Drops excluded properties from `value`, recursing into nested
    /// objects and arrays.
    pub fn apply(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                map.retain(|key, _| !self.is_excluded(key));
                for nested in map.values_mut() {
                    self.apply(nested);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.apply(item);
                }
            }
            _ => {}
        }
    }

    fn is_excluded(&self, key: &str) -> bool {
        self.excludes.iter().any(|name| name == key)
            || self
                .exclude_prefixes
                .iter()
                .any(|prefix| key.starts_with(prefix.as_str()))
    }
}

/// One declared response-shaping rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseDirective {
    /// Status for successful results.
    SuccessCode(StatusCode),
    /// Status for empty results.
    EmptyResultCode(StatusCode),
    /// Status for `null` results.
    NullResultCode(StatusCode),
    /// Status for undefined results.
    UndefinedResultCode(StatusCode),
    /// Status for errors without their own status.
    ErrorCode(StatusCode),
    /// A response header.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// The `Content-Type` header.
    ContentType(String),
    /// The `Location` header.
    Location(String),
    /// Redirect target; `:key` segments are filled from an object result.
    Redirect(String),
    /// Template to render with the result.
    RenderedTemplate(String),
    /// Force JSON responses.
    JsonResponse,
    /// Force text responses.
    TextResponse,
    /// Serialization options for JSON results.
    TransformOptions(TransformOptions),
}

impl ResponseDirective {
    /// The directive's kind.
    #[must_use]
    pub fn kind(&self) -> ResponseHandlerType {
        match self {
            Self::SuccessCode(_) => ResponseHandlerType::SuccessCode,
            Self::EmptyResultCode(_) => ResponseHandlerType::EmptyResultCode,
            Self::NullResultCode(_) => ResponseHandlerType::NullResultCode,
            Self::UndefinedResultCode(_) => ResponseHandlerType::UndefinedResultCode,
            Self::ErrorCode(_) => ResponseHandlerType::ErrorCode,
            Self::Header { .. } => ResponseHandlerType::Header,
            Self::ContentType(_) => ResponseHandlerType::ContentType,
            Self::Location(_) => ResponseHandlerType::Location,
            Self::Redirect(_) => ResponseHandlerType::Redirect,
            Self::RenderedTemplate(_) => ResponseHandlerType::RenderedTemplate,
            Self::JsonResponse => ResponseHandlerType::JsonResponse,
            Self::TextResponse => ResponseHandlerType::TextResponse,
            Self::TransformOptions(_) => ResponseHandlerType::TransformOptions,
        }
    }
}

/// Compiled directives of one action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDirectives {
    /// Status for successful results.
    pub success_code: Option<StatusCode>,
    /// Status for empty results.
    pub empty_result_code: Option<StatusCode>,
    /// Status for `null` results.
    pub null_result_code: Option<StatusCode>,
    /// Status for undefined results.
    pub undefined_result_code: Option<StatusCode>,
    /// Status for errors without their own status.
    pub error_code: Option<StatusCode>,
    /// `Content-Type` header.
    pub content_type: Option<String>,
    /// `Location` header.
    pub location: Option<String>,
    /// Redirect target.
    pub redirect: Option<String>,
    /// Template name.
    pub rendered_template: Option<String>,
    /// Forced JSON.
    pub json: bool,
    /// Forced text.
    pub text: bool,
    /// Serialization options.
    pub transform: Option<TransformOptions>,
    /// Custom headers in declaration order.
    pub headers: Vec<(String, String)>,
}

impl ResponseDirectives {
    /// Compiles `directives` in one pass.
    pub fn compile<'a>(directives: impl IntoIterator<Item = &'a ResponseDirective>) -> Self {
        let mut compiled = Self::default();
        for directive in directives {
            match directive {
                ResponseDirective::SuccessCode(code) => {
                    compiled.success_code.get_or_insert(*code);
                }
                ResponseDirective::EmptyResultCode(code) => {
                    compiled.empty_result_code.get_or_insert(*code);
                }
                ResponseDirective::NullResultCode(code) => {
                    compiled.null_result_code.get_or_insert(*code);
                }
                ResponseDirective::UndefinedResultCode(code) => {
                    compiled.undefined_result_code.get_or_insert(*code);
                }
                ResponseDirective::ErrorCode(code) => {
                    compiled.error_code.get_or_insert(*code);
                }
                ResponseDirective::Header { name, value } => {
                    compiled.headers.push((name.clone(), value.clone()));
                }
                ResponseDirective::ContentType(value) => {
                    compiled.content_type.get_or_insert_with(|| value.clone());
                }
                ResponseDirective::Location(value) => {
                    compiled.location.get_or_insert_with(|| value.clone());
                }
                ResponseDirective::Redirect(value) => {
                    compiled.redirect.get_or_insert_with(|| value.clone());
                }
                ResponseDirective::RenderedTemplate(value) => {
                    compiled.rendered_template.get_or_insert_with(|| value.clone());
                }
                ResponseDirective::JsonResponse => compiled.json = true,
                ResponseDirective::TextResponse => compiled.text = true,
                ResponseDirective::TransformOptions(options) => {
                    compiled.transform.get_or_insert_with(|| options.clone());
                }
            }
        }
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_first_directive_of_kind_wins() {
        let directives = [
            ResponseDirective::SuccessCode(StatusCode::CREATED),
            ResponseDirective::SuccessCode(StatusCode::ACCEPTED),
            ResponseDirective::Header {
                name: "x-a".into(),
                value: "1".into(),
            },
            ResponseDirective::Header {
                name: "x-b".into(),
                value: "2".into(),
            },
        ];
        let compiled = ResponseDirectives::compile(&directives);
        assert_eq!(compiled.success_code, Some(StatusCode::CREATED));
        assert_eq!(
            compiled.headers,
            vec![("x-a".to_string(), "1".to_string()), ("x-b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            ResponseDirective::Redirect("/".into()).kind(),
            ResponseHandlerType::Redirect
        );
        assert_eq!(ResponseDirective::TextResponse.kind(), ResponseHandlerType::TextResponse);
    }

    #[test]
    fn test_transform_options_apply() {
        let options = TransformOptions {
            excludes: vec!["password".into()],
            exclude_prefixes: vec!["_".into()],
        };
        let mut value = json!({
            "name": "ada",
            "password": "secret",
            "_rev": 3,
            "friends": [{"name": "bob", "password": "x"}]
        });
        options.apply(&mut value);
        assert_eq!(value, json!({"name": "ada", "friends": [{"name": "bob"}]}));
    }

    fn status() -> impl Strategy<Value = StatusCode> {
        (200u16..600).prop_map(|code| StatusCode::from_u16(code).unwrap())
    }

    fn directive() -> impl Strategy<Value = ResponseDirective> {
        prop_oneof![
            status().prop_map(ResponseDirective::SuccessCode),
            status().prop_map(ResponseDirective::ErrorCode),
            ("x-[a-z]{1,6}", "[a-z0-9]{0,6}")
                .prop_map(|(name, value)| ResponseDirective::Header { name, value }),
            "[a-z]{1,8}/[a-z]{1,8}".prop_map(ResponseDirective::ContentType),
            "/[a-z]{0,8}".prop_map(ResponseDirective::Redirect),
            Just(ResponseDirective::JsonResponse),
        ]
    }

    proptest! {
        #[test]
        fn test_compile_keeps_first_of_each_kind(
            directives in prop::collection::vec(directive(), 0..16)
        ) {
            let compiled = ResponseDirectives::compile(&directives);

            let first_success = directives.iter().find_map(|d| match d {
                ResponseDirective::SuccessCode(code) => Some(*code),
                _ => None,
            });
            let first_error = directives.iter().find_map(|d| match d {
                ResponseDirective::ErrorCode(code) => Some(*code),
                _ => None,
            });
            let first_content_type = directives.iter().find_map(|d| match d {
                ResponseDirective::ContentType(value) => Some(value.clone()),
                _ => None,
            });
            let first_redirect = directives.iter().find_map(|d| match d {
                ResponseDirective::Redirect(value) => Some(value.clone()),
                _ => None,
            });
            let headers: Vec<(String, String)> = directives
                .iter()
                .filter_map(|d| match d {
                    ResponseDirective::Header { name, value } => Some((name.clone(), value.clone())),
                    _ => None,
                })
                .collect();

            prop_assert_eq!(compiled.success_code, first_success);
            prop_assert_eq!(compiled.error_code, first_error);
            prop_assert_eq!(compiled.content_type, first_content_type);
            prop_assert_eq!(compiled.redirect, first_redirect);
            prop_assert_eq!(compiled.headers, headers);
            prop_assert_eq!(
                compiled.json,
                directives.contains(&ResponseDirective::JsonResponse)
            );
        }
    }
}
