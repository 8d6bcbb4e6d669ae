//! `Type(scope)` rule string parsing

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MalformedRuleError;
use crate::rules::{Category, CommandPattern, PathKey, PathPattern, Rule, RuleType, Scope};

/// Type token, optional gap, then a parenthesized scope spanning to the end
static RULE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<type>[^()\s]*)(?P<gap>\s*)\((?P<scope>.*)\)$").unwrap()
});

/// Parse one raw permission string into a [`Rule`].
///
/// Whitespace around the whole string and just inside the parentheses is
/// ignored; whitespace between the type and `(` is not.
pub fn parse_rule(raw: &str, category: Category) -> Result<Rule, MalformedRuleError> {
    let caps = RULE_PATTERN
        .captures(raw.trim())
        .ok_or_else(|| MalformedRuleError::NotTypeScope {
            raw: raw.to_string(),
        })?;

    let type_token = &caps["type"];
    if type_token.is_empty() {
        return Err(MalformedRuleError::EmptyType {
            raw: raw.to_string(),
        });
    }
    if !caps["gap"].is_empty() {
        return Err(MalformedRuleError::DetachedParen {
            raw: raw.to_string(),
        });
    }

    let scope = caps["scope"].trim();
    if scope.is_empty() {
        return Err(MalformedRuleError::EmptyScope {
            raw: raw.to_string(),
        });
    }

    let rule_type =
        RuleType::from_name(type_token).ok_or_else(|| MalformedRuleError::UnknownType {
            raw: raw.to_string(),
            rule_type: type_token.to_string(),
        })?;

    Ok(Rule::new(
        raw.to_string(),
        rule_type,
        parse_scope(rule_type, scope),
        category,
    ))
}

/// Classify a scope as a path or command pattern for the given tool
pub fn parse_scope(rule_type: RuleType, scope: &str) -> Scope {
    if let Some((key, pattern)) = PathKey::strip_from(scope) {
        return Scope::Path(parse_path(Some(key), pattern));
    }

    if rule_type.has_opaque_scope() {
        return Scope::Command(CommandPattern {
            tokens: vec![scope.to_string()],
            wildcard: false,
        });
    }

    if rule_type.is_file_tool() && looks_like_path(scope) {
        return Scope::Path(parse_path(None, scope));
    }

    Scope::Command(parse_command(scope))
}

fn looks_like_path(scope: &str) -> bool {
    scope.starts_with('/')
        || scope.starts_with('~')
        || scope.starts_with("./")
        || scope.starts_with("../")
}

fn parse_path(key: Option<PathKey>, pattern: &str) -> PathPattern {
    let pattern = pattern.trim();
    let absolute = pattern.starts_with('/');

    let (base, recursive) = match pattern.strip_suffix("/**") {
        Some(base) => (base, true),
        None if pattern == "**" => ("", true),
        None => (pattern, false),
    };

    PathPattern {
        key,
        absolute,
        components: base
            .split('/')
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect(),
        recursive,
    }
}

fn parse_command(scope: &str) -> CommandPattern {
    let scope = scope.trim();

    let (body, wildcard) = if let Some(body) = scope.strip_suffix(":*") {
        (body, true)
    } else {
        match scope.strip_suffix('*') {
            Some(body) if body.is_empty() || body.ends_with(char::is_whitespace) => (body, true),
            _ => (scope, false),
        }
    };

    CommandPattern {
        tokens: body.split_whitespace().map(String::from).collect(),
        wildcard,
    }
}
