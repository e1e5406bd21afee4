use serde::{Deserialize, Serialize};

use crate::evaluate::fragment::{self, Reference};
use crate::evaluate::CUSTOM_FUNCTION;
use crate::parse::{parse_with, ParseOptions};
use crate::{Attribute, Node, ValidationError};

/// Policy used to check that a rule only references known attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Parse the rule and check every attribute it references.
    #[default]
    Structural,
    /// Legacy gate: pass if any known attribute name occurs anywhere in the
    /// raw text, including inside literals or longer identifiers.
    Substring,
}

/// Validate rule source with the default parse options.
///
/// # Errors
///
/// See [`validate_with`].
pub fn validate(source: &str, mode: ValidationMode) -> Result<(), ValidationError> {
    validate_with(source, mode, &ParseOptions::default())
}

/// Validate rule source.
///
/// # Errors
///
/// In [`ValidationMode::Structural`]: [`ValidationError::Malformed`] if the
/// source does not parse, [`ValidationError::UnknownAttribute`] naming the
/// first reference outside the whitelist, or
/// [`ValidationError::UnknownFunction`] for a call other than
/// `custom_function` inside an operand fragment.
///
/// In [`ValidationMode::Substring`]: [`ValidationError::NoRecognizedAttribute`]
/// if no known attribute name appears in the text.
pub fn validate_with(
    source: &str,
    mode: ValidationMode,
    options: &ParseOptions,
) -> Result<(), ValidationError> {
    match mode {
        ValidationMode::Structural => validate_node(&parse_with(source, options)?),
        ValidationMode::Substring => {
            if Attribute::ALL
                .iter()
                .any(|attribute| source.contains(attribute.as_str()))
            {
                Ok(())
            } else {
                Err(ValidationError::NoRecognizedAttribute)
            }
        }
    }
}

/// Check every attribute referenced by an already built tree, including the
/// names looked up inside operand fragments.
///
/// # Errors
///
/// As for [`ValidationMode::Structural`] in [`validate_with`].
pub fn validate_node(node: &Node) -> Result<(), ValidationError> {
    for leaf in node.leaves() {
        match leaf {
            Node::Comparison(comparison) => check_attribute(&comparison.attribute)?,
            Node::Operand(text) => {
                for reference in fragment::references(text)? {
                    match reference {
                        Reference::Attribute(name) => check_attribute(&name)?,
                        Reference::Function(name) if name == CUSTOM_FUNCTION => {}
                        Reference::Function(name) => {
                            return Err(ValidationError::UnknownFunction { name })
                        }
                    }
                }
            }
            Node::Operator { .. } => {}
        }
    }
    Ok(())
}

fn check_attribute(name: &str) -> Result<(), ValidationError> {
    if Attribute::is_known(name) {
        Ok(())
    } else {
        Err(ValidationError::UnknownAttribute {
            attribute: name.to_owned(),
        })
    }
}
