//! YAML declarations.
//!
//! # File shape
//!
//! ```yaml
//! owner: 0oa1app
//! relations:
//!   - id: 00g1admins
//!     priority: 0
//!     profile: { role: admin }
//!   - id: 00g2users
//!     profile: '{"role":"user"}'
//! ```
//!
//! `relations` may be omitted, which declares an empty membership (every
//! existing relation is then reported as drift).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{self, WireRelation};
use crate::error::{io_err, InputError};
use crate::types::{DesiredSet, OwnerId};

/// A parsed and validated declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub owner: OwnerId,
    pub desired: DesiredSet,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeclarationFile {
    owner: String,
    #[serde(default)]
    relations: Vec<WireRelation>,
}

/// Load and validate a declaration from `path`.
///
/// Returns `InputError::DeclarationNotFound` if absent,
/// `InputError::Parse` (with path + line context) if malformed YAML, and the
/// codec / set validation errors for bad entries.
pub fn load_at(path: &Path) -> Result<Declaration, InputError> {
    if !path.exists() {
        return Err(InputError::DeclarationNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let file: DeclarationFile =
        serde_yaml::from_str(&contents).map_err(|e| InputError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    from_file(file)
}

/// Parse a declaration from an in-memory YAML document.
pub fn parse(yaml: &str) -> Result<Declaration, InputError> {
    let file: DeclarationFile = serde_yaml::from_str(yaml).map_err(|e| InputError::Parse {
        path: "<inline>".into(),
        source: e,
    })?;
    from_file(file)
}

/// Render a declaration back to YAML (canonical payloads, `Unset` omitted).
pub fn to_yaml(declaration: &Declaration) -> Result<String, serde_yaml::Error> {
    let file = DeclarationFile {
        owner: declaration.owner.0.clone(),
        relations: declaration.desired.iter().map(codec::encode).collect(),
    };
    serde_yaml::to_string(&file)
}

fn from_file(file: DeclarationFile) -> Result<Declaration, InputError> {
    if file.owner.trim().is_empty() {
        return Err(InputError::MissingOwner);
    }
    let relations = codec::decode_all(file.relations)?;
    Ok(Declaration {
        owner: OwnerId::from(file.owner),
        desired: DesiredSet::new(relations)?,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderValue;

    #[test]
    fn parses_owner_and_relations_in_order() {
        let decl = parse(
            "owner: app1\nrelations:\n  - id: g2\n    priority: 0\n  - id: g1\n    profile: { role: admin }\n",
        )
        .expect("parse");
        assert_eq!(decl.owner, OwnerId::from("app1"));
        let ids: Vec<_> = decl.desired.iter().map(|r| r.target_id.0.as_str()).collect();
        assert_eq!(ids, ["g2", "g1"]);
        assert_eq!(decl.desired.relations()[0].ordering, OrderValue::Explicit(0));
        assert_eq!(decl.desired.relations()[1].ordering, OrderValue::Unset);
    }

    #[test]
    fn missing_relations_is_empty_declaration() {
        let decl = parse("owner: app1\n").expect("parse");
        assert!(decl.desired.is_empty());
    }

    #[test]
    fn blank_owner_is_rejected() {
        let err = parse("owner: ''\n").unwrap_err();
        assert!(matches!(err, InputError::MissingOwner));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse("owner: app1\nrelations:\n  - id: g1\n  - id: g1\n").unwrap_err();
        assert!(matches!(err, InputError::DuplicateTarget { .. }));
    }

    #[test]
    fn yaml_rendering_reparses_to_same_declaration() {
        let decl = parse("owner: app1\nrelations:\n  - id: g1\n    priority: 0\n    profile: '{\"a\":1}'\n")
            .expect("parse");
        let yaml = to_yaml(&decl).expect("yaml");
        assert_eq!(parse(&yaml).expect("reparse"), decl);
    }

    #[test]
    fn load_at_distinguishes_missing_file_from_content() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("app1.yaml");
        assert!(matches!(
            load_at(&path).unwrap_err(),
            InputError::DeclarationNotFound { .. }
        ));

        std::fs::write(&path, "owner: app1\n").expect("write");
        assert_eq!(load_at(&path).expect("load").owner, OwnerId::from("app1"));
    }
}
