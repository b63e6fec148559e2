//! Stacks: the clusters environments run on

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource::{Links, Resource, ResourceManager};

/// A stack, shared or dedicated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Shared stacks are public
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Owning organization; only dedicated stacks have one
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default, alias = "_links")]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stack {
    /// Dedicated stacks belong to an organization
    pub fn is_dedicated(&self) -> bool {
        self.organization_id
            .as_deref()
            .is_some_and(|org| !org.is_empty())
    }
}

impl Resource for Stack {
    const PATH: &'static str = "/stacks";
    const COLLECTION: &'static str = "stacks";

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Stacks are read-only here; the generic manager covers them
pub type StackManager = ResourceManager<Stack>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dedicated_requires_non_empty_org() {
        let stack = Stack::hydrate(json!({
            "id": 10, "name": "shared-us-west-1", "region": "us-west-1",
            "public": true, "organization_id": null
        }))
        .unwrap();
        assert!(!stack.is_dedicated());

        let stack = Stack::hydrate(json!({
            "id": 11, "name": "acme-prod", "organization_id": "org-1"
        }))
        .unwrap();
        assert!(stack.is_dedicated());
        assert_eq!(stack.name(), Some("acme-prod"));
    }
}
