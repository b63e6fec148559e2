//! Handle resolution within an optional parent scope
//!
//! Handles are only unique inside their parent (an app handle inside its
//! account), so a global list can hold several resources with the same
//! handle. Lookups narrow by scope when one is given and refuse to guess
//! when more than one candidate is left.

use crate::error::{CoreError, Result};
use crate::resource::Resource;

/// A resolved parent used to narrow handle matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// What the parent is called in messages (`account`)
    pub kind: &'static str,
    pub handle: String,
    pub id: i64,
}

/// Pick the single resource named `handle`
///
/// `kind` names the resource in messages. `parent_id` extracts the scope
/// relation from a candidate; candidates without one never match a scope.
pub fn select<T, F>(
    kind: &str,
    handle: &str,
    items: Vec<T>,
    scope: Option<&Scope>,
    parent_id: F,
) -> Result<T>
where
    T: Resource,
    F: Fn(&T) -> Option<i64>,
{
    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| item.name() == Some(handle))
        .collect();

    if matches.is_empty() {
        return Err(CoreError::NotFound(format!(
            "No {} with handle {}.",
            kind, handle
        )));
    }

    let Some(scope) = scope else {
        if matches.len() == 1 {
            return Ok(matches.remove(0));
        }
        return Err(CoreError::Ambiguous(format!(
            "Multiple {}s found with handle {}. Please provide an account handle.",
            kind, handle
        )));
    };

    matches.retain(|item| parent_id(item) == Some(scope.id));
    match matches.len() {
        0 => Err(CoreError::NotFound(format!(
            "No {} with handle {} in {} {}.",
            kind, handle, scope.kind, scope.handle
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(CoreError::Ambiguous(format!(
            "{} {}s found with handle {} in {} {}.",
            n, kind, handle, scope.kind, scope.handle
        ))),
    }
}

/// Treat an empty optional handle the same as an absent one
pub fn non_empty(handle: Option<&str>) -> Option<&str> {
    handle.map(str::trim).filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::App;
    use serde_json::json;

    fn app(id: i64, handle: &str, account: i64) -> App {
        App::hydrate(json!({
            "id": id,
            "handle": handle,
            "_links": {"account": {"href": format!("https://api.aptible.com/accounts/{}", account)}}
        }))
        .unwrap()
    }

    fn apps() -> Vec<App> {
        vec![app(1, "web", 10), app(2, "web", 20), app(3, "worker", 10)]
    }

    fn account(id: i64, handle: &str) -> Scope {
        Scope {
            kind: "account",
            handle: handle.to_string(),
            id,
        }
    }

    fn account_of(app: &App) -> Option<i64> {
        app.account_id().ok()
    }

    #[test]
    fn test_unique_handle_without_scope() {
        let found = select("app", "worker", apps(), None, account_of).unwrap();
        assert_eq!(found.id, 3);
    }

    #[test]
    fn test_no_match() {
        let err = select("app", "api", apps(), None, account_of).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No app with handle api.");
    }

    #[test]
    fn test_duplicate_without_scope_is_ambiguous() {
        let err = select("app", "web", apps(), None, account_of).unwrap_err();
        assert!(matches!(err, CoreError::Ambiguous(_)));
        assert!(err.to_string().contains("Please provide an account handle"));
    }

    #[test]
    fn test_scope_narrows_to_one() {
        let scope = account(20, "staging");
        let found = select("app", "web", apps(), Some(&scope), account_of).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn test_scope_narrows_to_zero() {
        let scope = account(30, "sandbox");
        let err = select("app", "web", apps(), Some(&scope), account_of).unwrap_err();
        assert_eq!(err.to_string(), "No app with handle web in account sandbox.");
    }

    #[test]
    fn test_scope_applies_even_to_single_match() {
        let scope = account(20, "staging");
        let err = select("app", "worker", apps(), Some(&scope), account_of).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_residual_ambiguity_is_an_error() {
        let items = vec![app(1, "web", 10), app(4, "web", 10)];
        let scope = account(10, "prod");
        let err = select("app", "web", items, Some(&scope), account_of).unwrap_err();
        assert!(matches!(err, CoreError::Ambiguous(_)));
        assert!(err.to_string().starts_with("2 apps found"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("prod")), Some("prod"));
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(None), None);
    }
}
