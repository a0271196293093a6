//! Hand-built descriptors matching the files under `proto/`, field for field.
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions,
    field_descriptor_proto::{Label, Type},
};

/// The descriptor set `protoc --include_imports` would produce for every fixture file.
pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![happyday_proto(), other_items_proto(), shop_items_proto()],
    }
}

fn happyday_proto() -> FileDescriptorProto {
    let scores_entry = DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(
            "ScoresEntry",
            vec![field("key", 1, Type::String), field("value", 2, Type::Int32)],
        )
    };

    let weather = EnumDescriptorProto {
        name: Some("Weather".to_string()),
        value: ["WEATHER_UNSPECIFIED", "SUNNY", "RAINY"]
            .into_iter()
            .zip(0..)
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some(name.to_string()),
                number: Some(number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    let request = DescriptorProto {
        nested_type: vec![scores_entry],
        enum_type: vec![weather],
        ..message(
            "HappyDayRequest",
            vec![
                field("date", 1, Type::String),
                field("include_reason", 2, Type::Bool),
                repeated(field("lucky_numbers", 3, Type::Int32)),
                repeated(typed_field(
                    "scores",
                    4,
                    Type::Message,
                    ".happyday.HappyDayRequest.ScoresEntry",
                )),
                typed_field(
                    "weather",
                    5,
                    Type::Enum,
                    ".happyday.HappyDayRequest.Weather",
                ),
            ],
        )
    };

    let response = DescriptorProto {
        nested_type: vec![message(
            "Details",
            vec![field("formatted_date", 1, Type::String)],
        )],
        ..message(
            "HappyDayResponse",
            vec![
                field("is_happy_day", 1, Type::Bool),
                field("reason", 2, Type::String),
                typed_field(
                    "details",
                    3,
                    Type::Message,
                    ".happyday.HappyDayResponse.Details",
                ),
            ],
        )
    };

    let ping = message("Ping", vec![field("ok", 1, Type::Bool)]);

    file(
        "happyday.proto",
        "happyday",
        vec![],
        vec![request, response, ping],
    )
}

fn other_items_proto() -> FileDescriptorProto {
    file(
        "other/items.proto",
        "other",
        vec![],
        vec![message("Item", vec![field("name", 1, Type::String)])],
    )
}

fn shop_items_proto() -> FileDescriptorProto {
    let item = message(
        "Item",
        vec![
            field("sku", 1, Type::String),
            field("quantity", 2, Type::Int32),
        ],
    );

    let line = DescriptorProto {
        nested_type: vec![message("Item", vec![field("note", 1, Type::String)])],
        ..message("Line", vec![])
    };

    let by_sku_entry = DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(
            "BySkuEntry",
            vec![
                field("key", 1, Type::String),
                typed_field("value", 2, Type::Message, ".shop.Item"),
            ],
        )
    };

    let order = DescriptorProto {
        nested_type: vec![by_sku_entry, line],
        ..message(
            "Order",
            vec![
                repeated(typed_field("items", 1, Type::Message, ".shop.Item")),
                typed_field("gift", 2, Type::Message, ".other.Item"),
                repeated(typed_field(
                    "by_sku",
                    3,
                    Type::Message,
                    ".shop.Order.BySkuEntry",
                )),
            ],
        )
    };

    file(
        "shop/items.proto",
        "shop",
        vec!["other/items.proto"],
        vec![item, order],
    )
}

fn file(
    name: &str,
    package: &str,
    dependencies: Vec<&str>,
    messages: Vec<DescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        dependency: dependencies.into_iter().map(String::from).collect(),
        message_type: messages,
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

fn typed_field(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, ty)
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

// Same rule protoc applies when filling `json_name`.
fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
