use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
  String,
  Int,
  Boolean,
  Long,
  Timestamp,
  Binary,
  Byte,
  Real,
  /// Any primitive value.
  Primitive,
}

impl PrimitiveType {
  pub fn name(&self) -> &'static str {
    match self {
      Self::String => "string",
      Self::Int => "int",
      Self::Boolean => "boolean",
      Self::Long => "long",
      Self::Timestamp => "timestamp",
      Self::Binary => "binary",
      Self::Byte => "byte",
      Self::Real => "real",
      Self::Primitive => "primitive",
    }
  }

  pub fn lookup(name: &str) -> Option<Self> {
    PRIMITIVE_TYPES.get(name).copied()
  }
}

impl Display for PrimitiveType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

// `bool` is an alias and renders back as `boolean`.
static PRIMITIVE_TYPES: phf::Map<&'static str, PrimitiveType> = phf::phf_map! {
  "string" => PrimitiveType::String,
  "int" => PrimitiveType::Int,
  "boolean" => PrimitiveType::Boolean,
  "bool" => PrimitiveType::Boolean,
  "long" => PrimitiveType::Long,
  "timestamp" => PrimitiveType::Timestamp,
  "binary" => PrimitiveType::Binary,
  "byte" => PrimitiveType::Byte,
  "real" => PrimitiveType::Real,
  "primitive" => PrimitiveType::Primitive,
};

/// The parsed type of a property, or of a set/list/map element.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypeExpr {
  Primitive { primitive: PrimitiveType },
  Object { object: Arc<str> },
  Set { members: Box<TypeExpr> },
  List { members: Box<TypeExpr> },
  Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
}

impl TypeExpr {
  pub fn object_name(&self) -> Option<&str> {
    match self {
      Self::Object { object } => Some(&**object),
      _ => None,
    }
  }

  /// Every object type name referenced anywhere in this expression, in
  /// left-to-right order.
  pub fn object_refs(&self) -> Vec<&str> {
    let mut out = vec![];
    self.collect_object_refs(&mut out);
    out
  }

  fn collect_object_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      Self::Primitive { .. } => {}
      Self::Object { object } => out.push(&**object),
      Self::Set { members } | Self::List { members } => members.collect_object_refs(out),
      Self::Map { key, value } => {
        key.collect_object_refs(out);
        value.collect_object_refs(out);
      }
    }
  }
}

impl Display for TypeExpr {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Primitive { primitive } => write!(f, "{}", primitive),
      Self::Object { object } => write!(f, "{}", object),
      Self::Set { members } => write!(f, "set:{}", members),
      Self::List { members } => write!(f, "list:{}", members),
      Self::Map { key, value } => write!(f, "{}:{}", key, value),
    }
  }
}

/// Parses a type string such as `set:User`, `list:int` or `string:list:Tag`.
///
/// Never fails: anything that is not a collection or a known primitive is an
/// object reference, checked once the whole schema is known. Recursion depth
/// follows the number of colons; property types are capped at
/// `compile::MAX_TYPE_DEPTH` levels before they get here.
pub fn parse_type(text: &str) -> TypeExpr {
  if let Some(rest) = text.strip_prefix("set:") {
    return TypeExpr::Set {
      members: Box::new(parse_type(rest)),
    };
  }
  if let Some(rest) = text.strip_prefix("list:") {
    return TypeExpr::List {
      members: Box::new(parse_type(rest)),
    };
  }

  // Split on the first colon only; the value side may itself be a map.
  if let Some((key, value)) = text.split_once(':') {
    return TypeExpr::Map {
      key: Box::new(parse_type(key)),
      value: Box::new(parse_type(value)),
    };
  }

  match PrimitiveType::lookup(text) {
    Some(primitive) => TypeExpr::Primitive { primitive },
    None => TypeExpr::Object {
      object: Arc::from(text),
    },
  }
}
