//! json tree form of tag filters as exchanged with the rest api.

use super::{
    parse, Comparison, EntityOrigin, EntitySpec, Expression, LogicalOperator, Operator,
    ParseError, TagValue,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TagFilterModel {
    #[serde(rename = "EXPRESSION")]
    Expression {
        #[serde(rename = "logicalOperator")]
        logical_operator: LogicalOperator,
        #[serde(default)]
        elements: Vec<TagFilterModel>,
    },
    #[serde(rename = "TAG_FILTER")]
    TagFilter(TagFilterLeaf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFilterLeaf {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub entity: EntityOrigin,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
    /// untyped value some endpoints return instead of the typed fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl TagFilterModel {
    /// expression without elements, meaning "match everything".
    pub fn empty() -> Self {
        TagFilterModel::Expression {
            logical_operator: LogicalOperator::And,
            elements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TagFilterModel::Expression { elements, .. } => elements.iter().all(Self::is_empty),
            TagFilterModel::TagFilter(_) => false,
        }
    }
}

impl Default for TagFilterModel {
    fn default() -> Self {
        Self::empty()
    }
}

/// convert an expression tree into the api tree, flattening same-operator chains.
pub fn to_api_model(expr: &Expression) -> TagFilterModel {
    match expr {
        Expression::Logical { operator, .. } => {
            let mut elements = Vec::new();
            collect_operands(expr, *operator, &mut elements);
            TagFilterModel::Expression {
                logical_operator: *operator,
                elements,
            }
        }
        Expression::Bracket(inner) => to_api_model(inner),
        Expression::Comparison(cmp) => TagFilterModel::TagFilter(leaf_to_api(cmp)),
    }
}

fn collect_operands(expr: &Expression, op: LogicalOperator, out: &mut Vec<TagFilterModel>) {
    match expr {
        Expression::Logical {
            left,
            operator,
            right,
        } if *operator == op => {
            collect_operands(left, op, out);
            collect_operands(right, op, out);
        }
        other => out.push(to_api_model(other)),
    }
}

fn leaf_to_api(cmp: &Comparison) -> TagFilterLeaf {
    let mut leaf = TagFilterLeaf {
        name: cmp.entity.name.clone(),
        key: cmp.entity.key.clone(),
        entity: cmp.entity.origin,
        operator: cmp.operator,
        string_value: None,
        number_value: None,
        boolean_value: None,
        value: None,
    };
    match &cmp.value {
        Some(TagValue::String(raw)) => leaf.string_value = Some(raw.clone()),
        Some(TagValue::Number(n)) => leaf.number_value = Some(*n),
        Some(TagValue::Boolean(b)) => leaf.boolean_value = Some(*b),
        None => {}
    }
    leaf
}

/// convert an api tree into an expression; empty expressions yield `None`.
pub fn from_api_model(model: &TagFilterModel) -> Option<Expression> {
    match model {
        TagFilterModel::TagFilter(leaf) => Some(Expression::Comparison(leaf_from_api(leaf))),
        TagFilterModel::Expression {
            logical_operator,
            elements,
        } => {
            let mut operands = elements
                .iter()
                .filter_map(|element| operand_from_api(element, *logical_operator));
            let first = operands.next()?;
            Some(operands.fold(first, |acc, next| {
                Expression::logical(acc, *logical_operator, next)
            }))
        }
    }
}

fn operand_from_api(model: &TagFilterModel, parent: LogicalOperator) -> Option<Expression> {
    let expr = from_api_model(model)?;
    let needs_bracket = match (&expr, model) {
        (
            Expression::Logical { .. },
            TagFilterModel::Expression {
                logical_operator, ..
            },
        ) => *logical_operator == parent || *logical_operator == LogicalOperator::Or,
        _ => false,
    };
    if needs_bracket {
        Some(Expression::Bracket(Box::new(expr)))
    } else {
        Some(expr)
    }
}

fn leaf_from_api(leaf: &TagFilterLeaf) -> Comparison {
    let value = if leaf.operator.is_unary() {
        None
    } else if let Some(raw) = &leaf.string_value {
        Some(TagValue::String(raw.clone()))
    } else if let Some(n) = leaf.number_value {
        Some(TagValue::Number(n))
    } else if let Some(b) = leaf.boolean_value {
        Some(TagValue::Boolean(b))
    } else {
        match &leaf.value {
            Some(serde_json::Value::Bool(b)) => Some(TagValue::Boolean(*b)),
            Some(serde_json::Value::Number(n)) => n.as_f64().map(TagValue::Number),
            Some(serde_json::Value::String(raw)) => Some(TagValue::String(raw.clone())),
            Some(other) => Some(TagValue::String(other.to_string())),
            None => Some(TagValue::String(String::new())),
        }
    };
    Comparison {
        entity: EntitySpec {
            name: leaf.name.clone(),
            key: leaf.key.clone(),
            origin: leaf.entity,
        },
        operator: leaf.operator,
        value,
    }
}

/// text of `expr` as it reads back from the api tree. brackets that do not
/// change meaning are dropped, so configured and read-back state agree.
pub fn canonical_text(expr: &Expression) -> String {
    tag_filter_from_api(&to_api_model(expr))
}

/// api tree for a textual filter; blank text maps to the empty expression.
pub fn tag_filter_to_api(text: &str) -> Result<TagFilterModel, ParseError> {
    if text.trim().is_empty() {
        return Ok(TagFilterModel::empty());
    }
    parse(text).map(|expr| to_api_model(&expr))
}

/// canonical text for an api tree; the empty expression renders as "".
pub fn tag_filter_from_api(model: &TagFilterModel) -> String {
    from_api_model(model)
        .map(|expr| expr.render())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_api_flattens_same_operator_chains() {
        let expr = parse("a IS_EMPTY AND b IS_EMPTY AND (c IS_EMPTY OR d IS_EMPTY)").unwrap();
        let model = to_api_model(&expr);
        let TagFilterModel::Expression {
            logical_operator,
            elements,
        } = &model
        else {
            panic!("expected expression");
        };
        assert_eq!(*logical_operator, LogicalOperator::And);
        assert_eq!(elements.len(), 3);
        assert!(matches!(
            &elements[2],
            TagFilterModel::Expression {
                logical_operator: LogicalOperator::Or,
                ..
            }
        ));
    }

    #[test]
    fn api_tree_maps_back_to_canonical_text() {
        let inputs = [
            "a@dest IS_EMPTY AND b@dest IS_EMPTY AND (c@dest IS_EMPTY OR d@dest IS_EMPTY)",
            "a@dest IS_EMPTY OR b@dest IS_EMPTY AND c@dest IS_EMPTY",
            "(a@dest IS_EMPTY AND b@src IS_EMPTY) AND c@na EQUALS 'x'",
            "x:k@src GREATER_THAN 1.5 OR y@dest EQUALS true",
        ];
        for input in inputs {
            let model = tag_filter_to_api(input).unwrap();
            assert_eq!(tag_filter_from_api(&model), input);
        }
    }

    #[test]
    fn serializes_wire_shape() {
        let model = tag_filter_to_api("call.type EQUALS 'HTTP'").unwrap();
        assert_eq!(
            serde_json::to_value(&model).unwrap(),
            json!({
                "type": "TAG_FILTER",
                "name": "call.type",
                "entity": "DESTINATION",
                "operator": "EQUALS",
                "stringValue": "HTTP"
            })
        );
    }

    #[test]
    fn reads_server_payload_with_defaults() {
        let model: TagFilterModel = serde_json::from_value(json!({
            "type": "EXPRESSION",
            "logicalOperator": "OR",
            "elements": [
                {"type": "TAG_FILTER", "name": "service.name", "operator": "CONTAINS", "value": "web"},
                {"type": "TAG_FILTER", "name": "http.status", "entity": "SOURCE", "operator": "GREATER_THAN", "numberValue": 499}
            ]
        }))
        .unwrap();
        assert_eq!(
            tag_filter_from_api(&model),
            "service.name@dest CONTAINS 'web' OR http.status@src GREATER_THAN 499"
        );
    }

    #[test]
    fn empty_expressions_render_blank() {
        assert_eq!(tag_filter_from_api(&TagFilterModel::empty()), "");
        assert_eq!(tag_filter_to_api("  ").unwrap(), TagFilterModel::empty());
        assert!(TagFilterModel::empty().is_empty());
    }
}
