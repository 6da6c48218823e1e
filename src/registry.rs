//! Datapoint registry
//!
//! An ordered, validated table of [`DatapointDefinition`]s. The registry is
//! built once, either from the built-in Midnite Classic table or from a YAML
//! file, and is read-only afterwards so it can be shared between passes.
//!
//! Construction fails on anything that would otherwise surface as a bug at
//! evaluation time: duplicate labels, `order` values that do not increase,
//! unreasonable precisions, and derivations that read a sibling not defined
//! before them. Formulas are already parsed by the time a definition exists.

pub mod builtin;

use crate::datapoint::{DatapointDefinition, Method};
use crate::error::{ClassicError, Result};
use crate::logging::get_logger;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Largest number of decimals a formula result may be rounded to
pub const MAX_PRECISION: u8 = 10;

static BUILTIN: OnceCell<Arc<Registry>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    definitions: Vec<DatapointDefinition>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Validate definitions and build the registry.
    ///
    /// An `order` of 0 is replaced by the next free position.
    pub fn new(definitions: Vec<DatapointDefinition>) -> Result<Self> {
        let logger = get_logger("registry");
        Self::build(definitions).inspect_err(|e| logger.error(&e.to_string()))
    }

    fn build(mut definitions: Vec<DatapointDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        let mut last_order = 0u32;

        for (position, def) in definitions.iter_mut().enumerate() {
            if def.label.trim().is_empty() {
                return Err(ClassicError::registry(
                    format!("#{}", position + 1),
                    "label must not be empty",
                ));
            }
            if index.contains_key(&def.label) {
                return Err(ClassicError::registry(&def.label, "duplicate label"));
            }

            if def.order == 0 {
                def.order = last_order.checked_add(1).ok_or_else(|| {
                    ClassicError::registry(&def.label, "order exceeds the maximum")
                })?;
            } else if def.order <= last_order {
                return Err(ClassicError::registry(
                    &def.label,
                    format!(
                        "order {} does not follow the previous order {}",
                        def.order, last_order
                    ),
                ));
            }
            last_order = def.order;

            if let Method::Formula {
                precision: Some(p), ..
            } = &def.method
            {
                if *p > MAX_PRECISION {
                    return Err(ClassicError::registry(
                        &def.label,
                        format!("precision {} exceeds {}", p, MAX_PRECISION),
                    ));
                }
            }

            for dependency in def.method.dependencies() {
                if !index.contains_key(*dependency) {
                    return Err(ClassicError::registry(
                        &def.label,
                        format!("reads '{}', which must be defined before it", dependency),
                    ));
                }
            }

            index.insert(def.label.clone(), position);
        }

        Ok(Self { definitions, index })
    }

    /// The built-in Midnite Classic registry, validated on first use
    pub fn builtin() -> Result<Arc<Registry>> {
        BUILTIN
            .get_or_try_init(|| {
                let definitions = builtin::definitions()?;
                Registry::new(definitions).map(Arc::new)
            })
            .cloned()
    }

    /// Parse a YAML sequence of definitions
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let definitions: Vec<DatapointDefinition> = serde_yaml::from_str(yaml)
            .map_err(|e| ClassicError::registry("<yaml>", e.to_string()))?;
        Self::new(definitions)
    }

    /// Load a registry from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClassicError::io(format!(
                "Failed to read registry file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Serialize the definitions back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.definitions)?)
    }

    pub fn get(&self, label: &str) -> Option<&DatapointDefinition> {
        self.index.get(label).map(|&i| &self.definitions[i])
    }

    /// Definitions in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &DatapointDefinition> {
        self.definitions.iter()
    }

    /// Every register read directly by a definition, ascending
    pub fn registers(&self) -> Vec<u16> {
        let mut registers: Vec<u16> = self
            .definitions
            .iter()
            .flat_map(|d| d.method.registers())
            .collect();
        registers.sort_unstable();
        registers.dedup();
        registers
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapoint::StageForm;

    fn formula(label: &str, src: &str) -> DatapointDefinition {
        DatapointDefinition::new(label, label, "", Method::formula(src, None).unwrap())
    }

    #[test]
    fn test_auto_order() {
        let registry = Registry::new(vec![formula("a", "[1]"), formula("b", "[2]")]).unwrap();
        let orders: Vec<u32> = registry.iter().map(|d| d.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(registry.get("b").unwrap().order, 2);
    }

    #[test]
    fn test_rejects_duplicate_label() {
        let err = Registry::new(vec![formula("a", "[1]"), formula("a", "[2]")]).unwrap_err();
        assert!(matches!(err, ClassicError::Registry { ref label, .. } if label == "a"));
    }

    #[test]
    fn test_rejects_decreasing_order() {
        let mut first = formula("a", "[1]");
        first.order = 10;
        let mut second = formula("b", "[2]");
        second.order = 5;
        assert!(Registry::new(vec![first, second]).is_err());
    }

    #[test]
    fn test_rejects_forward_dependency() {
        let stage = DatapointDefinition::new(
            "cstageword",
            "Charge Stage",
            "",
            Method::TranslateStage {
                form: StageForm::Word,
            },
        );
        let err = Registry::new(vec![stage.clone(), formula("cstate", "msb([4120])")]).unwrap_err();
        assert!(err.to_string().contains("cstate"));

        assert!(Registry::new(vec![formula("cstate", "msb([4120])"), stage]).is_ok());
    }

    #[test]
    fn test_rejects_excessive_precision() {
        let def = DatapointDefinition::new("a", "a", "", Method::formula("[1]", Some(11)).unwrap());
        assert!(Registry::new(vec![def]).is_err());
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = Registry::builtin().unwrap();
        let b = Registry::builtin().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
