use serde::Serialize;

use crate::domain::bandwidth::model::FILTER_ALL;
use crate::errors::QueryError;

/// Tag dimensions the dashboard offers as filter dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Project,
    Domain,
    Region,
    Tag,
}

impl Dimension {
    /// Path segment as exposed by the API, e.g. `/dimensions/projects`.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw {
            "projects" => Ok(Dimension::Project),
            "domains" => Ok(Dimension::Domain),
            "regions" => Ok(Dimension::Region),
            "tags" => Ok(Dimension::Tag),
            other => Err(QueryError::InvalidDimension(other.to_string())),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Project => "project",
            Dimension::Domain => "domain",
            Dimension::Region => "region",
            Dimension::Tag => "tag",
        }
    }

    pub fn all_label(&self) -> &'static str {
        match self {
            Dimension::Project => "All projects",
            Dimension::Domain => "All domains",
            Dimension::Region => "All regions",
            Dimension::Tag => "All tags",
        }
    }
}

/// One dropdown entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DimensionOption {
    pub label: String,
    pub value: String,
}

impl DimensionOption {
    /// The no-filter head entry every dropdown starts with.
    pub fn sentinel(dimension: Dimension) -> Self {
        DimensionOption {
            label: dimension.all_label().to_string(),
            value: FILTER_ALL.to_string(),
        }
    }
}
