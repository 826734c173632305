//! Request, response and shape descriptor types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// One generation call, built fresh and consumed by it
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest
{   /// Natural language prompt
    pub prompt: String
  , /// Expected response structure, sent as a schema hint
    pub shape: ShapeDescriptor
  , /// Fast or thorough model
    pub quality: crate::QualityMode
}

impl GenerationRequest
{   pub fn new(
      prompt: impl Into<String>
    , shape: ShapeDescriptor
    , quality: crate::QualityMode
    ) -> Self
    {   GenerationRequest
        {   prompt: prompt.into()
          , shape
          , quality
        }
    }
}

/// Declarative description of the expected JSON.
/// Rendered as the provider's response schema and optionally
/// checked against the decoded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum ShapeDescriptor
{   String
  , Number
  , Integer
  , Boolean
  , Array(Box<ShapeDescriptor>)
  , Object(Vec<Field>)
}

/// Named member of an object shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field
{   pub name: String
  , pub shape: ShapeDescriptor
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>
  , #[serde(default)]
    pub required: bool
}

impl Field
{   pub fn required(name: impl Into<String>, shape: ShapeDescriptor)
      -> Self
    {   Field
        {   name: name.into()
          , shape
          , description: None
          , required: true
        }
    }

    pub fn optional(name: impl Into<String>, shape: ShapeDescriptor)
      -> Self
    {   Field
        {   required: false
          , ..Field::required(name, shape)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self
    {   self.description = Some(description.into());
        self
    }
}

/// One place where a value strays from its shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation
{   /// JSON path, e.g. `items[2].name`; empty for the root
    pub path: String
  , pub message: String
}

impl fmt::Display for ShapeViolation
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   if self.path.is_empty()
        {   write!(f, "<root>: {}", self.message)
        } else
        {   write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl ShapeDescriptor
{   pub fn array_of(item: ShapeDescriptor) -> Self
    {   ShapeDescriptor::Array(Box::new(item))
    }

    pub fn object(fields: Vec<Field>) -> Self
    {   ShapeDescriptor::Object(fields)
    }

    /// Array of strings, the most common leaf in report shapes
    pub fn strings() -> Self
    {   Self::array_of(ShapeDescriptor::String)
    }

    fn type_name(&self) -> &'static str
    {   match self
        {   ShapeDescriptor::String => "STRING"
          , ShapeDescriptor::Number => "NUMBER"
          , ShapeDescriptor::Integer => "INTEGER"
          , ShapeDescriptor::Boolean => "BOOLEAN"
          , ShapeDescriptor::Array(_) => "ARRAY"
          , ShapeDescriptor::Object(_) => "OBJECT"
        }
    }

    /// Render in the provider schema dialect
    pub fn to_schema(&self) -> Value
    {   match self
        {   ShapeDescriptor::Array(item) => json!({
              "type": self.type_name(),
              "items": item.to_schema()
            })
          , ShapeDescriptor::Object(fields) => {
              let mut properties = Map::new();
              for field in fields
              {   let mut schema = field.shape.to_schema();
                  if let (Some(desc), Some(obj))
                    = (&field.description, schema.as_object_mut())
                  {   obj.insert(
                        "description".to_string(),
                        Value::String(desc.clone())
                      );
                  }
                  properties.insert(field.name.clone(), schema);
              }
              let required: Vec<&str> = fields.iter()
                .filter(|f| f.required)
                .map(|f| f.name.as_str())
                .collect();
              json!({
                "type": self.type_name(),
                "properties": properties,
                "required": required
              })
            }
          , _ => json!({ "type": self.type_name() })
        }
    }

    /// Check a decoded value, collecting every violation
    pub fn check(&self, value: &Value)
      -> Result<(), Vec<ShapeViolation>>
    {   let mut violations = Vec::new();
        self.check_at(value, String::new(), &mut violations);
        if violations.is_empty()
        {   Ok(())
        } else
        {   Err(violations)
        }
    }

    fn check_at(
      &self
    , value: &Value
    , path: String
    , out: &mut Vec<ShapeViolation>
    )
    {   let ok = match self
        {   ShapeDescriptor::String => value.is_string()
          , ShapeDescriptor::Number => value.is_number()
          , ShapeDescriptor::Integer => value.is_i64() || value.is_u64()
          , ShapeDescriptor::Boolean => value.is_boolean()
          , ShapeDescriptor::Array(item) => match value.as_array()
            {   Some(elements) => {
                  for (i, element) in elements.iter().enumerate()
                  {   item.check_at(
                        element,
                        format!("{}[{}]", path, i),
                        out
                      );
                  }
                  true
                }
              , None => false
            }
          , ShapeDescriptor::Object(fields) => match value.as_object()
            {   Some(map) => {
                  for field in fields
                  {   let child = if path.is_empty()
                      {   field.name.clone()
                      } else
                      {   format!("{}.{}", path, field.name)
                      };
                      match map.get(&field.name)
                      {   None | Some(Value::Null) if field.required => {
                            out.push(ShapeViolation
                            {   path: child
                              , message: "missing required field"
                                  .to_string()
                            });
                          }
                        , None | Some(Value::Null) => {}
                        , Some(v) => field.shape.check_at(v, child, out)
                      }
                  }
                  true
                }
              , None => false
            }
        };
        if !ok
        {   out.push(ShapeViolation
            {   path
              , message: format!(
                  "expected {}",
                  self.type_name().to_lowercase()
                )
            });
        }
    }
}

/// What the provider hands back for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse
{   /// Text payload, possibly wrapped in prose or fences
    pub text: Option<String>
  , /// Model that produced it
    pub model: String
}

/// What the client hands to a provider for one request
#[derive(Debug, Clone)]
pub struct ProviderRequest<'a>
{   pub api_key: &'a str
  , pub model: &'a str
  , pub prompt: &'a str
  , pub response_schema: Value
}
