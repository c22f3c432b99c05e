use serde_json::Value;

pub const FALLBACK_TEXT: &str = "Coach online. Ask about training, injuries, or nutrition.";

const FRAGMENT_SEPARATOR: &str = "\n";

/// The reply layouts the upstream is known to produce, checked in declaration
/// order. Each text-carrying arm holds non-blank text.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyShape {
  /// `{"output_text": "..."}`
  OutputText(String),
  /// `{"output": [{"content": [{"text": "..."}]}]}` and its variants.
  OutputBlocks(Vec<String>),
  /// `{"choices": [{"message": {"content": "..."}}]}`
  ChatChoices(String),
  Unrecognized,
}

impl ReplyShape {
  pub fn classify(reply: &Value) -> Self {
    if let Some(text) = non_blank(reply.get("output_text")) {
      return Self::OutputText(text);
    }

    let fragments = output_fragments(reply);
    if !fragments.is_empty() {
      return Self::OutputBlocks(fragments);
    }

    if let Some(text) = non_blank(reply.pointer("/choices/0/message/content")) {
      return Self::ChatChoices(text);
    }

    Self::Unrecognized
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::OutputText(_) => "output_text",
      Self::OutputBlocks(_) => "output_blocks",
      Self::ChatChoices(_) => "chat_choices",
      Self::Unrecognized => "unrecognized",
    }
  }

  pub fn into_text(self) -> String {
    match self {
      Self::OutputText(text) | Self::ChatChoices(text) => text,
      Self::OutputBlocks(fragments) => fragments.join(FRAGMENT_SEPARATOR).trim().to_string(),
      Self::Unrecognized => FALLBACK_TEXT.to_string(),
    }
  }
}

fn non_blank(value: Option<&Value>) -> Option<String> {
  let text = value?.as_str()?.trim();
  (!text.is_empty()).then(|| text.to_string())
}

fn output_fragments(reply: &Value) -> Vec<String> {
  let Some(blocks) = reply.get("output").and_then(Value::as_array) else {
    return Vec::new();
  };

  let mut fragments = Vec::new();
  for block in blocks {
    match block.get("content") {
      Some(Value::String(text)) => fragments.push(text.clone()),
      Some(Value::Array(parts)) => fragments.extend(
        parts
          .iter()
          .filter_map(|part| part.get("text").and_then(Value::as_str))
          .map(str::to_string),
      ),
      _ => {
        if let Some(text) = block.get("text").and_then(Value::as_str) {
          fragments.push(text.to_string());
        }
      }
    }
  }

  fragments.retain(|fragment| !fragment.trim().is_empty());
  fragments
}
