#[cfg(test)]
pub mod test_utils {
    use crate::reflect::{FieldMeta, RecordDescriptor, TypeDescriptor};
    use crate::Reflect;
    use serde::{Deserialize, Serialize};

    /// A product record described by hand, without the derive
    #[allow(dead_code)]
    pub fn product_descriptor() -> TypeDescriptor {
        RecordDescriptor::new()
            .field("id", TypeDescriptor::string(), FieldMeta::new())
            .field(
                "price",
                TypeDescriptor::number(),
                FieldMeta::new().minimum("0.01"),
            )
            .field(
                "tags",
                TypeDescriptor::sequence(TypeDescriptor::string()),
                FieldMeta::new().min_items("1"),
            )
            .field(
                "description",
                TypeDescriptor::optional(TypeDescriptor::string()),
                FieldMeta::new().omit_empty(),
            )
            .private_field("secret", TypeDescriptor::string())
            .field("internal", TypeDescriptor::boolean(), FieldMeta::new().skip())
            .into()
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Reflect)]
    #[serde(rename_all = "lowercase")]
    pub enum Colour {
        Red,
        Green,
        Blue,
    }

    /// A small request/response body
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
    pub struct Widget {
        pub name: String,
        #[schema(minimum = 0)]
        pub count: u32,
        #[serde(default)]
        pub colour: Option<Colour>,
    }
}
