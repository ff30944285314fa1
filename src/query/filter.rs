//! Filter expressions in the provider's query language
//!
//! Equality leaves serialize as `["is", field, [values...]]` and logical
//! nodes as `[op, [children...]]`.

use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterExpression {
    Equality { field: String, values: Vec<String> },
    Logical {
        op: LogicalOp,
        children: Vec<FilterExpression>,
    },
}

impl FilterExpression {
    pub fn is(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterExpression::Equality {
            field: field.into(),
            values: vec![value.into()],
        }
    }

    pub fn any_of(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Logical {
            op: LogicalOp::Or,
            children,
        }
    }
}

impl Serialize for FilterExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterExpression::Equality { field, values } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("is")?;
                seq.serialize_element(field)?;
                seq.serialize_element(values)?;
                seq.end()
            }
            FilterExpression::Logical { op, children } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(op.as_str())?;
                seq.serialize_element(children)?;
                seq.end()
            }
        }
    }
}
