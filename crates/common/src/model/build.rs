use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{BuildType, ShapeKind};
use crate::shape::{field, Directive, FieldSpec, Shape};

/// A queued, running or finished build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Build {
    #[serde(with = "super::id_format", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_type: Option<BuildType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Shape for Build {
    const KIND: ShapeKind = ShapeKind::Build;

    fn fields() -> &'static [FieldSpec<Self>] {
        static FIELDS: Lazy<Vec<FieldSpec<Build>>> = Lazy::new(|| {
            vec![
                field!(Build, "id" => id),
                field!(Build, "buildType" => build_type, Directive::Skip),
                field!(Build, "state" => state, Directive::Skip),
                field!(Build, "status" => status, Directive::Skip),
            ]
        });
        &FIELDS
    }
}
