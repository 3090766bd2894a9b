use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Annotation, Annotations, TypeDesc};

/// Declared shape of one field of a class.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMetadata {
    pub name: String,
    pub ty: TypeDesc,
    pub annotations: Annotations,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Annotations::none(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations = self.annotations.with(annotation);
        self
    }
}

/// Declared shape of a class: its name and ordered fields.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMetadata {
    name: String,
    fields: Vec<FieldMetadata>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field declaration.
    pub fn field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A copy of this class without the named field.
    pub fn without_field(&self, name: &str) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.iter().filter(|f| f.name != name).cloned().collect(),
        }
    }
}

/// Registered classes by name.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ClassMetadata>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a class.
    pub fn register(&mut self, class: ClassMetadata) -> Arc<ClassMetadata> {
        let class = Arc::new(class);
        self.classes.insert(class.name().to_string(), Arc::clone(&class));
        class
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassMetadata>> {
        self.classes.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = ClassRegistry::new();
        registry.register(
            ClassMetadata::new("Pet")
                .field(FieldMetadata::new("name", TypeDesc::Text))
                .field(FieldMetadata::new("age", TypeDesc::Integer).annotated(Annotation::Index)),
        );
        let pet = registry.get("Pet").unwrap();
        assert_eq!(pet.fields().len(), 2);
        assert_eq!(
            pet.field_named("age").unwrap().annotations.index_override(),
            Some(true)
        );
        assert!(registry.get("Car").is_none());
    }

    #[test]
    fn without_field_drops_only_that_field() {
        let class = ClassMetadata::new("Person")
            .field(FieldMetadata::new("id", TypeDesc::Integer))
            .field(FieldMetadata::new("name", TypeDesc::Text));
        let stripped = class.without_field("id");
        assert_eq!(stripped.name(), "Person");
        assert_eq!(stripped.fields().len(), 1);
        assert!(stripped.field_named("id").is_none());
    }
}
