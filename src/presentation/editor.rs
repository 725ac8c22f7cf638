//! Headless property-editor descriptors.
//!
//! Rendering lives in the host. This module only describes which editor a
//! property wants and with what current state, so a host can map the
//! descriptor onto its own widget set.

use crate::application::{
    BoolControl, BoolPureControl, CodeControl, CodeType, DropdownControl, DropdownOption,
    ParamsControl,
};

/// Presentation parameters shared by all property editors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlParams {
    pub label: Option<String>,
    pub tooltip: Option<String>,
    pub placeholder: Option<String>,
}

impl ControlParams {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

/// What a property wants to be edited with.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorView {
    /// An expression-capable code field holding the raw template text.
    CodeEditor { code: String },
    /// A plain on/off switch.
    Switch { value: bool },
    /// A checkbox, the boxier sibling of the switch.
    Checkbox { value: bool },
    /// A closed selection.
    Dropdown {
        selected: &'static str,
        options: Vec<&'static str>,
    },
    /// A labeled wrapper around another editor.
    Labeled {
        params: ControlParams,
        inner: Box<EditorView>,
    },
}

impl EditorView {
    fn labeled(params: ControlParams, inner: EditorView) -> EditorView {
        EditorView::Labeled {
            params,
            inner: Box::new(inner),
        }
    }
}

impl<T: CodeType> CodeControl<T> {
    /// The bare editor for this control: a code field over the raw text.
    pub fn editor_view(&self) -> EditorView {
        EditorView::CodeEditor {
            code: self.unevaled_value().to_string(),
        }
    }

    pub fn property_view(&self, params: ControlParams) -> EditorView {
        EditorView::labeled(params, self.editor_view())
    }
}

impl<T: CodeType> ParamsControl<T> {
    pub fn editor_view(&self) -> EditorView {
        self.text().editor_view()
    }

    pub fn property_view(&self, params: ControlParams) -> EditorView {
        self.text().property_view(params)
    }
}

impl BoolPureControl {
    pub fn editor_view(&self) -> EditorView {
        EditorView::Switch {
            value: self.get_view(),
        }
    }

    pub fn property_view(&self, params: ControlParams) -> EditorView {
        EditorView::labeled(params, self.editor_view())
    }

    pub fn checkbox_property_view(&self, params: ControlParams) -> EditorView {
        EditorView::labeled(
            params,
            EditorView::Checkbox {
                value: self.get_view(),
            },
        )
    }
}

impl<T: DropdownOption> DropdownControl<T> {
    pub fn editor_view(&self) -> EditorView {
        EditorView::Dropdown {
            selected: self.get_view().as_str(),
            options: T::all().iter().map(DropdownOption::as_str).collect(),
        }
    }

    pub fn property_view(&self, params: ControlParams) -> EditorView {
        EditorView::labeled(params, self.editor_view())
    }
}

impl BoolControl {
    /// Unsupported: the editor shape depends on the current mode and the
    /// wrapper state that only [`BoolControl::property_view`] carries.
    /// Reaching this is a call-site bug, not a data problem.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn editor_view(&self) -> EditorView {
        panic!("BoolControl has no bare editor view; use property_view");
    }

    /// The full editor: a switch in literal mode, a code field in
    /// expression mode, either way with a mode toggle attached.
    pub fn property_view(&self, params: ControlParams) -> EditorView {
        let inner = if self.uses_code_editor() {
            EditorView::CodeEditor {
                code: self.code_control().unevaled_value().to_string(),
            }
        } else {
            EditorView::Switch {
                value: self.code_control().unevaled_value() == "true",
            }
        };
        EditorView::labeled(params, inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{StringControl, ValidationType};

    #[test]
    fn test_code_control_editor() {
        let control = StringControl::new("{{x}}");
        assert_eq!(
            control.editor_view(),
            EditorView::CodeEditor {
                code: "{{x}}".to_string()
            }
        );
    }

    #[test]
    fn test_labeled_wrapper() {
        let control = BoolPureControl::new(true);
        let view = control.property_view(ControlParams::labeled("Required"));
        let EditorView::Labeled { params, inner } = view else {
            panic!("expected labeled editor");
        };
        assert_eq!(params.label.as_deref(), Some("Required"));
        assert_eq!(*inner, EditorView::Switch { value: true });
    }

    #[test]
    fn test_dropdown_options() {
        let control = DropdownControl::new(ValidationType::Email);
        let EditorView::Dropdown { selected, options } = control.editor_view() else {
            panic!("expected dropdown");
        };
        assert_eq!(selected, "Email");
        assert_eq!(options, vec!["Text", "Email", "URL", "Regex"]);
    }

    #[test]
    fn test_bool_control_mode_editor() {
        let literal = BoolControl::from_json_value(&serde_json::json!(true));
        let EditorView::Labeled { inner, .. } = literal.property_view(ControlParams::default())
        else {
            panic!("expected labeled editor");
        };
        assert_eq!(*inner, EditorView::Switch { value: true });

        let bound = BoolControl::from_json_value(&serde_json::json!("{{flag}}"));
        let EditorView::Labeled { inner, .. } = bound.property_view(ControlParams::default())
        else {
            panic!("expected labeled editor");
        };
        assert_eq!(
            *inner,
            EditorView::CodeEditor {
                code: "{{flag}}".to_string()
            }
        );
    }

    #[test]
    #[should_panic(expected = "no bare editor view")]
    fn test_bool_control_bare_editor_panics() {
        BoolControl::new().editor_view();
    }
}
