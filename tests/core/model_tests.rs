//! Model boundary tests: variable handles and reference-string resolution.

use plantlog::model::{resolve_reference, ModelVariable, VarRef, VariableSource};

use crate::common::DemoModel;

#[test]
fn test_resolve_indexed_reference() {
    let model = DemoModel::new();
    let reference = resolve_reference(&model, "pressure[:]").unwrap();
    assert_eq!(reference.name(), "pressure");
    assert!(reference.is_indexed());
    assert_eq!(reference.value(1), Some(101_325.0));
    assert_eq!(reference.keys().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_resolve_plain_and_keyed_forms() {
    let model = DemoModel::new();
    assert!(resolve_reference(&model, "temperature").is_some());
    assert!(resolve_reference(&model, "temperature[2]").is_some());
}

#[test]
fn test_unknown_or_empty_reference() {
    let model = DemoModel::new();
    assert!(resolve_reference(&model, "enthalpy[:]").is_none());
    assert!(resolve_reference(&model, "").is_none());
    assert!(resolve_reference(&model, "not a name").is_none());
}

#[test]
fn test_scalar_variable_source() {
    struct OneVar(VarRef);
    impl VariableSource for OneVar {
        fn variable(&self, name: &str) -> Option<VarRef> {
            (name == self.0.name()).then(|| self.0.clone())
        }
    }

    let source = OneVar(ModelVariable::scalar("volume", "tank volume (m^3)", 10.0).into_ref());
    let reference = resolve_reference(&source, "volume").unwrap();
    assert!(!reference.is_indexed());
    assert_eq!(reference.scalar_value(), Some(10.0));
    assert_eq!(reference.doc(), "tank volume (m^3)");
}

#[test]
fn test_handle_outlives_model() {
    let reference = {
        let model = DemoModel::new();
        resolve_reference(&model, "volume[:]").unwrap()
    };
    assert_eq!(reference.value(3), Some(10.0));
}
