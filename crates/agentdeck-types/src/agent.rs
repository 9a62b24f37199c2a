use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Agent definition as configured on the runtime server.
///
/// Fields the playground does not interpret are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_collection: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentDefinition {
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_keeps_unknown_fields() {
        let json = r#"{
            "name": "demo",
            "description": "Demo agent",
            "model": "gpt-4o",
            "tools": ["search", {"name": "calc"}],
            "temperature": 0.2
        }"#;
        let def: AgentDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.tools.len(), 2);
        assert_eq!(def.knowledge_collection, None);
        assert_eq!(def.extra.get("temperature"), Some(&serde_json::json!(0.2)));
        assert_eq!(def.summary().description.as_deref(), Some("Demo agent"));
    }
}
