//! The shape the provider is asked to reply with.
//!
//! The expected story is described as a tree of [`SchemaNode`]s rather than a literal string, so
//! the same description renders the example embedded in the prompt and reports which parts of a
//! reply are missing.
use serde_json::{Map, Value};

/// Top-level sections without which a reply is rejected.
pub const REQUIRED_SECTIONS: [&str; 2] = ["introduction", "cosmicBlueprint"];

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A free-text field; the string is the example shown to the provider.
    Text(&'static str),
    /// A numeric field with an example value.
    Number(i64),
    /// An object whose fields appear in the listed order.
    Object(Vec<(&'static str, SchemaNode)>),
    /// A fixed-length list. Each entry describes the item at that position.
    List(Vec<SchemaNode>),
}

impl SchemaNode {
    /// Renders the example value that goes into the prompt.
    pub fn example(&self) -> Value {
        match self {
            SchemaNode::Text(example) => Value::String((*example).to_string()),
            SchemaNode::Number(example) => Value::from(*example),
            SchemaNode::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, node)| ((*name).to_string(), node.example()))
                    .collect(),
            ),
            SchemaNode::List(items) => Value::Array(items.iter().map(SchemaNode::example).collect()),
        }
    }

    /// Field names of an object node, in order. Empty for any other node.
    pub fn keys(&self) -> Vec<&'static str> {
        match self {
            SchemaNode::Object(fields) => fields.iter().map(|(name, _)| *name).collect(),
            _ => Vec::new(),
        }
    }

    /// Dotted paths of every field this node describes that `sections` lacks or mistypes.
    pub fn missing_paths(&self, sections: &Map<String, Value>) -> Vec<String> {
        let mut missing = Vec::new();
        if let SchemaNode::Object(fields) = self {
            for (name, node) in fields {
                node.collect_missing(sections.get(*name), name, &mut missing);
            }
        }
        missing
    }

    fn collect_missing(&self, value: Option<&Value>, path: &str, missing: &mut Vec<String>) {
        match (self, value) {
            (_, None | Some(Value::Null)) => missing.push(path.to_string()),
            (SchemaNode::Text(_), Some(Value::String(_))) => {}
            (SchemaNode::Number(_), Some(Value::Number(_))) => {}
            (SchemaNode::Object(fields), Some(Value::Object(map))) => {
                for (name, node) in fields {
                    node.collect_missing(map.get(*name), &format!("{path}.{name}"), missing);
                }
            }
            (SchemaNode::List(items), Some(Value::Array(values))) => {
                for (index, node) in items.iter().enumerate() {
                    node.collect_missing(values.get(index), &format!("{path}[{index}]"), missing);
                }
            }
            _ => missing.push(path.to_string()),
        }
    }
}

fn sign(sign: &'static str, icon: &'static str, description: &'static str) -> SchemaNode {
    SchemaNode::Object(vec![
        ("sign", SchemaNode::Text(sign)),
        ("icon", SchemaNode::Text(icon)),
        ("description", SchemaNode::Text(description)),
    ])
}

fn milestone(year: &'static str, icon: &'static str) -> SchemaNode {
    SchemaNode::Object(vec![
        ("year", SchemaNode::Text(year)),
        ("icon", SchemaNode::Text(icon)),
        (
            "event",
            SchemaNode::Text("A notable historical event that happened on this day"),
        ),
    ])
}

fn guide_tip(icon: &'static str, title: &'static str) -> SchemaNode {
    SchemaNode::Object(vec![
        ("icon", SchemaNode::Text(icon)),
        ("title", SchemaNode::Text(title)),
        (
            "description",
            SchemaNode::Text("One or two sentences of warm, practical advice"),
        ),
    ])
}

/// The full story shape requested from the provider.
pub fn story_schema() -> SchemaNode {
    SchemaNode::Object(vec![
        (
            "introduction",
            SchemaNode::Object(vec![
                ("title", SchemaNode::Text("Welcome to the world, <name>! ✨")),
                (
                    "text",
                    SchemaNode::Text("A short, magical welcome mentioning the birth date and city"),
                ),
            ]),
        ),
        (
            "cosmicBlueprint",
            SchemaNode::Object(vec![
                ("title", SchemaNode::Text("Cosmic Blueprint 🌌")),
                (
                    "sun",
                    sign("Taurus", "♉", "What the sun sign says about their core self"),
                ),
                (
                    "moon",
                    sign("Cancer", "♋", "What the moon sign says about their emotions"),
                ),
                (
                    "rising",
                    sign("Leo", "♌", "What the rising sign says about how others see them"),
                ),
                (
                    "actionTip",
                    SchemaNode::Text("One parenting tip inspired by this blueprint"),
                ),
            ]),
        ),
        (
            "milestones",
            SchemaNode::Object(vec![
                ("title", SchemaNode::Text("On Your Birthday in History 📜")),
                (
                    "events",
                    SchemaNode::List(vec![milestone("1969", "🚀"), milestone("1985", "🎵")]),
                ),
                (
                    "funFact",
                    SchemaNode::Text("A fun fact about the birth date or city"),
                ),
            ]),
        ),
        (
            "numberMagic",
            SchemaNode::Object(vec![
                ("title", SchemaNode::Text("Number Magic 🔢")),
                ("lifePathNumber", SchemaNode::Number(7)),
                (
                    "personality",
                    SchemaNode::Text("What this life path number suggests about their personality"),
                ),
                (
                    "actionTip",
                    SchemaNode::Text("One parenting tip inspired by this number"),
                ),
            ]),
        ),
        (
            "guide",
            SchemaNode::Object(vec![
                ("title", SchemaNode::Text("Your Parenting Guide 🧭")),
                (
                    "tips",
                    SchemaNode::List(vec![
                        guide_tip("🌱", "Nurture curiosity"),
                        guide_tip("💛", "Celebrate feelings"),
                        guide_tip("🎨", "Make room for play"),
                    ]),
                ),
            ]),
        ),
        (
            "conclusion",
            SchemaNode::Object(vec![(
                "title",
                SchemaNode::Text("A Universe of Possibilities Awaits 🌟"),
            )]),
        ),
    ])
}
