use crate::errors::ModelError;
use crate::model::{populate_record, Attributes, Fields, Model};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record of any kind, for endpoints which have no dedicated struct.
///
/// The kind is only known at runtime, so collections of [GenericModel]
/// check the kind of inserted elements.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GenericModel {
    #[serde(skip)]
    kind: String,
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl GenericModel {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Value of an attribute which is not one of the common [Fields].
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }
}

impl Model for GenericModel {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn populate(&mut self, attributes: Attributes) -> Result<&mut Self, ModelError> {
        let kind = std::mem::take(&mut self.kind);
        let result = populate_record(self, attributes);
        self.kind = kind;
        result?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelId;
    use serde_json::json;

    #[test]
    fn test_populate_keeps_kind() {
        let mut model = GenericModel::new("software");
        let Value::Object(attributes) = json!({"id": 2, "executable": true}) else {
            unreachable!()
        };
        model.populate(attributes).unwrap();
        assert_eq!(model.kind(), "software");
        assert_eq!(model.id(), Some(ModelId(2)));
        assert_eq!(model.get("executable"), Some(&json!(true)));
        assert_eq!(model.uri(), "software/2.json");
    }
}
