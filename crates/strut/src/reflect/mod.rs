/*!
Type reflection.

Rust has no runtime type introspection, so every reflectable type describes
itself once through [`Reflect::descriptor`], usually generated by
`#[derive(Reflect)]`. The descriptor is a closed set of type categories that
[`reflect_descriptor`] walks to build a [`SchemaNode`] tree.

Reflection never fails: categories it does not understand degrade to an
unset node. There is no cycle detection, so a self-referential type will not
terminate.
*/

mod impls;
mod meta;

pub use meta::FieldMeta;

use crate::schema::{SchemaKind, SchemaNode};
use serde_json::Value;

/// Types that can describe their own shape for schema generation
pub trait Reflect {
    /// Describe this type
    fn descriptor() -> TypeDescriptor;
}

/// Shape of a Rust type, as far as JSON Schema cares
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// String, integer, number or boolean, with an optional format hint
    Scalar {
        kind: SchemaKind,
        format: Option<&'static str>,
    },
    /// `Option<T>`; reflects as the inner type with `nullable` set
    Optional(Box<TypeDescriptor>),
    /// Homogeneous sequence of the element type
    Sequence(Box<TypeDescriptor>),
    /// String-keyed map; only the value type is described
    Mapping(Box<TypeDescriptor>),
    /// Struct with named fields
    Record(RecordDescriptor),
    /// Fieldless enum, serialized as one of the listed strings
    Enumeration(Vec<String>),
    /// Anything else
    Opaque,
}

impl TypeDescriptor {
    pub fn scalar(kind: SchemaKind) -> Self {
        TypeDescriptor::Scalar { kind, format: None }
    }

    pub fn formatted(kind: SchemaKind, format: &'static str) -> Self {
        TypeDescriptor::Scalar {
            kind,
            format: Some(format),
        }
    }

    pub fn string() -> Self {
        Self::scalar(SchemaKind::String)
    }

    pub fn integer() -> Self {
        Self::scalar(SchemaKind::Integer)
    }

    pub fn number() -> Self {
        Self::scalar(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::scalar(SchemaKind::Boolean)
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    pub fn sequence(element: TypeDescriptor) -> Self {
        TypeDescriptor::Sequence(Box::new(element))
    }

    pub fn mapping(value: TypeDescriptor) -> Self {
        TypeDescriptor::Mapping(Box::new(value))
    }

    /// Descriptor of any reflectable type
    pub fn of<T: Reflect + ?Sized>() -> Self {
        T::descriptor()
    }
}

/// Named fields of a struct, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDescriptor {
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible field
    pub fn field(mut self, ident: &'static str, ty: TypeDescriptor, meta: FieldMeta) -> Self {
        self.fields.push(FieldDescriptor {
            ident,
            visible: true,
            meta,
            ty,
        });
        self
    }

    /// Add a field hidden behind the encapsulation boundary
    pub fn private_field(mut self, ident: &'static str, ty: TypeDescriptor) -> Self {
        self.fields.push(FieldDescriptor {
            ident,
            visible: false,
            meta: FieldMeta::default(),
            ty,
        });
        self
    }
}

impl From<RecordDescriptor> for TypeDescriptor {
    fn from(record: RecordDescriptor) -> Self {
        TypeDescriptor::Record(record)
    }
}

/// One struct member together with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// The member's own name
    pub ident: &'static str,
    /// Whether the member is `pub`
    pub visible: bool,
    pub meta: FieldMeta,
    pub ty: TypeDescriptor,
}

impl FieldDescriptor {
    /// Name the field has on the wire
    pub fn wire_name(&self) -> &str {
        self.meta
            .rename
            .as_deref()
            .unwrap_or_else(|| self.ident.strip_prefix("r#").unwrap_or(self.ident))
    }
}

/// Reflect a type into a schema node
pub fn reflect<T: Reflect + ?Sized>() -> SchemaNode {
    reflect_descriptor(&T::descriptor())
}

/// Reflect an already built descriptor
pub fn reflect_descriptor(descriptor: &TypeDescriptor) -> SchemaNode {
    match descriptor {
        TypeDescriptor::Optional(_) => {
            let mut inner = descriptor;
            while let TypeDescriptor::Optional(next) = inner {
                inner = next;
            }
            reflect_descriptor(inner).with_nullable(true)
        }
        TypeDescriptor::Scalar { kind, format } => {
            let mut node = SchemaNode::of_kind(*kind);
            node.format = format.map(str::to_string);
            node
        }
        TypeDescriptor::Sequence(element) => SchemaNode::array(reflect_descriptor(element)),
        TypeDescriptor::Mapping(value) => {
            let mut node = SchemaNode::object();
            node.additional_properties = Some(Box::new(reflect_descriptor(value)));
            node
        }
        TypeDescriptor::Record(record) => reflect_record(record),
        TypeDescriptor::Enumeration(variants) => {
            let mut node = SchemaNode::of_kind(SchemaKind::String);
            node.enum_values = variants.iter().cloned().map(Value::String).collect();
            node
        }
        TypeDescriptor::Opaque => SchemaNode::default(),
    }
}

fn reflect_record(record: &RecordDescriptor) -> SchemaNode {
    let mut node = SchemaNode::object();
    collect_fields(record, &mut node);
    node
}

fn collect_fields(record: &RecordDescriptor, node: &mut SchemaNode) {
    for field in &record.fields {
        if !field.visible || field.meta.skip {
            continue;
        }

        if field.meta.flatten {
            flatten_into(&field.ty, node);
            continue;
        }

        let name = field.wire_name().to_string();
        if !field.meta.omit_empty {
            node.required.insert(name.clone());
        }

        let mut schema = reflect_descriptor(&field.ty);
        field.meta.apply(&mut schema);
        node.properties
            .get_or_insert_with(Default::default)
            .insert(name, schema);
    }
}

/// Merge the members of a flattened record into its parent
///
/// A flattened map contributes its value schema as the parent's
/// `additionalProperties`; the first map to do so wins.
fn flatten_into(descriptor: &TypeDescriptor, node: &mut SchemaNode) {
    match descriptor {
        TypeDescriptor::Record(inner) => collect_fields(inner, node),
        TypeDescriptor::Mapping(value) => {
            if node.additional_properties.is_none() {
                node.additional_properties = Some(Box::new(reflect_descriptor(value)));
            }
        }
        TypeDescriptor::Optional(inner) => {
            // An absent flattened struct makes all of its members optional
            let mut scratch = SchemaNode::object();
            flatten_into(inner, &mut scratch);
            if let Some(props) = scratch.properties {
                node.properties
                    .get_or_insert_with(Default::default)
                    .extend(props);
            }
            if node.additional_properties.is_none() {
                node.additional_properties = scratch.additional_properties;
            }
        }
        _ => {}
    }
}
