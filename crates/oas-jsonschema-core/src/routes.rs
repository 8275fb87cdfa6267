//! Matching concrete request URLs to path templates.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// An operation matched from a concrete URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundOperation {
    /// The part of the URL matched by a server entry.
    pub origin: String,
    /// Path template in `:name` form, e.g. `/pets/:petId`.
    pub path: String,
    /// Path template as written in the document, e.g. `/pets/{petId}`.
    pub non_normalized_path: String,
    /// Bound path parameters keyed `:name`.
    pub slugs: BTreeMap<String, String>,
    pub method: String,
}

/// Replace each `{name}` in `template` with `lookup(name)`; unknown names
/// are left as written.
pub(crate) fn fill_template(
    template: &str,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let placeholder = &rest[start..=start + len];
        match lookup(&placeholder[1..placeholder.len() - 1]) {
            Some(value) => out.push_str(&value),
            None => out.push_str(placeholder),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Regex source for a `{var}` template plus the variable names in order.
fn template_regex(template: &str, capture: &str) -> (String, Vec<String>) {
    let mut names = Vec::new();
    let mut pattern = String::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        pattern.push_str(&regex::escape(&rest[..start]));
        pattern.push_str(capture);
        names.push(rest[start + 1..start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    (pattern, names)
}

/// Match `url` against each server in turn, then against `paths`.
///
/// When several templates match, the one binding the fewest parameters wins
/// (`/pets/mine` beats `/pets/{id}`); ties go to document order.
pub(crate) fn find_operation(
    api: &Value,
    servers: &[String],
    url: &str,
    method: &str,
) -> Option<FoundOperation> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin().ascii_serialization();
    if origin == "null" {
        return None;
    }
    let target = format!("{origin}{}", parsed.path());
    let method = method.to_ascii_lowercase();
    let paths = api.get("paths")?.as_object()?;

    for server in servers {
        let server = server.trim_end_matches('/');
        let absolute = if server.is_empty() || server.starts_with('/') {
            format!("{origin}{server}")
        } else {
            server.to_string()
        };

        let (pattern, _) = template_regex(&absolute, "[^/]+");
        let Ok(re) = Regex::new(&format!("^{pattern}")) else {
            tracing::debug!(server = %absolute, "skipping server with unusable url");
            continue;
        };
        let Some(matched) = re.find(&target) else {
            continue;
        };
        let rest = &target[matched.end()..];
        if !rest.is_empty() && !rest.starts_with('/') {
            continue;
        }
        let rest = if rest.is_empty() { "/" } else { rest };

        if let Some((template, slugs)) = match_path(paths, rest, &method) {
            return Some(FoundOperation {
                origin: matched.as_str().to_string(),
                path: fill_template(&template, |name| Some(format!(":{name}"))),
                non_normalized_path: template,
                slugs,
                method: method.clone(),
            });
        }
    }

    None
}

fn match_path(
    paths: &Map<String, Value>,
    path: &str,
    method: &str,
) -> Option<(String, BTreeMap<String, String>)> {
    paths
        .iter()
        .filter(|(_, item)| item.get(method).is_some_and(Value::is_object))
        .filter_map(|(template, _)| {
            let (pattern, names) = template_regex(template.trim_end_matches('/'), "([^/]+)");
            let re = Regex::new(&format!("^{pattern}/?$")).ok()?;
            let captures = re.captures(path)?;
            let slugs = names
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, capture)| {
                    capture.map(|c| (format!(":{name}"), c.as_str().to_string()))
                })
                .collect::<BTreeMap<_, _>>();
            Some((template.clone(), slugs))
        })
        .min_by_key(|(_, slugs)| slugs.len())
}
