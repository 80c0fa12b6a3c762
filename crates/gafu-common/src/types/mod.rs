//! Workspace platform types shared by the server and its collaborators

use crate::error::{GafuError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Reference to a workspace object.
///
/// Accepts any form the workspace understands (`ws/name`, `wsid/objid`,
/// `wsid/objid/version`). References built from an [`ObjectInfo`] are always
/// the fully-qualified `wsid/objid/version` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(String);

impl ObjectRef {
    /// Wrap a caller-supplied reference
    pub fn parse(reference: impl Into<String>) -> Result<Self> {
        let reference = reference.into();
        let trimmed = reference.trim();
        if trimmed.is_empty() || trimmed.split('/').any(|part| part.trim().is_empty()) {
            return Err(GafuError::InvalidReference(reference));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build the `workspace/name` reference used to look up a named object
    pub fn compose(workspace_name: &str, object_name: &str) -> Self {
        Self(format!("{}/{}", workspace_name, object_name))
    }

    /// Fully-qualified `wsid/objid/version` reference of one object version
    pub fn from_info(info: &ObjectInfo) -> Self {
        Self(format!("{}/{}/{}", info.wsid, info.objid, info.version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire layout of the workspace object info tuple
type ObjectInfoTuple = (
    i64,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    i64,
    Option<BTreeMap<String, String>>,
);

/// Object info as returned by `Workspace.get_object_info_new`.
///
/// Serialized as the workspace's positional 11-element array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub objid: i64,
    pub name: String,
    pub type_string: String,
    pub save_date: String,
    pub version: i64,
    pub saved_by: String,
    pub wsid: i64,
    pub workspace: String,
    pub checksum: String,
    pub size: i64,
    pub meta: Option<BTreeMap<String, String>>,
}

impl From<ObjectInfoTuple> for ObjectInfo {
    fn from(t: ObjectInfoTuple) -> Self {
        Self {
            objid: t.0,
            name: t.1,
            type_string: t.2,
            save_date: t.3,
            version: t.4,
            saved_by: t.5,
            wsid: t.6,
            workspace: t.7,
            checksum: t.8,
            size: t.9,
            meta: t.10,
        }
    }
}

impl<'de> Deserialize<'de> for ObjectInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        ObjectInfoTuple::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for ObjectInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (
            self.objid,
            &self.name,
            &self.type_string,
            &self.save_date,
            self.version,
            &self.saved_by,
            self.wsid,
            &self.workspace,
            &self.checksum,
            self.size,
            &self.meta,
        )
            .serialize(serializer)
    }
}

/// KBase-style boolean: `1` is true, anything else is false.
///
/// JSON booleans are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KbBool(pub bool);

impl KbBool {
    pub fn is_set(self) -> bool {
        self.0
    }
}

impl<'de> Deserialize<'de> for KbBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Bool(bool),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(value) => KbBool(value == 1),
            Raw::Bool(value) => KbBool(value),
        })
    }
}

impl Serialize for KbBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(i64::from(self.0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_info_json() -> serde_json::Value {
        json!([
            7,
            "G1",
            "KBaseGenomeAnnotations.GenomeAnnotation-2.1",
            "2016-05-04T17:22:04+0000",
            1,
            "someuser",
            1234,
            "ws1",
            "d41d8cd98f00b204e9800998ecf8427e",
            5120,
            null
        ])
    }

    #[test]
    fn test_object_info_from_tuple() {
        let info: ObjectInfo = serde_json::from_value(sample_info_json()).unwrap();
        assert_eq!(info.objid, 7);
        assert_eq!(info.name, "G1");
        assert_eq!(info.version, 1);
        assert_eq!(info.wsid, 1234);
        assert_eq!(info.workspace, "ws1");
        assert!(info.meta.is_none());
    }

    #[test]
    fn test_object_info_serializes_positionally() {
        let info: ObjectInfo = serde_json::from_value(sample_info_json()).unwrap();
        assert_eq!(serde_json::to_value(&info).unwrap(), sample_info_json());
    }

    #[test]
    fn test_object_info_rejects_short_tuple() {
        let result: std::result::Result<ObjectInfo, _> =
            serde_json::from_value(json!([7, "G1", "type"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_ref_from_info_uses_wsid_objid_version() {
        let info: ObjectInfo = serde_json::from_value(sample_info_json()).unwrap();
        assert_eq!(ObjectRef::from_info(&info).as_str(), "1234/7/1");
    }

    #[test]
    fn test_ref_compose() {
        assert_eq!(ObjectRef::compose("ws1", "G1").to_string(), "ws1/G1");
    }

    #[test]
    fn test_ref_parse() {
        assert_eq!(ObjectRef::parse(" 12/3/4 ").unwrap().as_str(), "12/3/4");
        assert!(ObjectRef::parse("").is_err());
        assert!(ObjectRef::parse("ws1//3").is_err());
    }

    #[test]
    fn test_kb_bool() {
        let set: KbBool = serde_json::from_value(json!(1)).unwrap();
        let unset: KbBool = serde_json::from_value(json!(0)).unwrap();
        let other: KbBool = serde_json::from_value(json!(2)).unwrap();
        let flag: KbBool = serde_json::from_value(json!(true)).unwrap();
        assert!(set.is_set());
        assert!(!unset.is_set());
        assert!(!other.is_set());
        assert!(flag.is_set());
        assert_eq!(serde_json::to_value(set).unwrap(), json!(1));
    }
}
