//! Annotation rule sets
//!
//! Collects the events of one annotation into a rule set: the `{...}`
//! object of rules and the free text after it. Rule values are kept as
//! positioned trees so every rule can report errors on its own value.

use crate::errors::{ErrorKind, SchemaError, SchemaResult};
use crate::json::unquote;
use crate::lexeme::{LexEvent, LexEventType};

/// A rule value as written.
#[derive(Debug, Clone)]
pub(crate) enum RuleValue {
    Literal(LexEvent),
    Object(Vec<RuleEntry>, LexEvent),
    Array(Vec<RuleValue>, LexEvent),
}

impl RuleValue {
    pub fn lex(&self) -> &LexEvent {
        match self {
            RuleValue::Literal(lex) | RuleValue::Object(_, lex) | RuleValue::Array(_, lex) => lex,
        }
    }
}

/// One `key: value` pair of a rule object.
#[derive(Debug, Clone)]
pub(crate) struct RuleEntry {
    pub key: String,
    pub key_lex: LexEvent,
    pub value: RuleValue,
}

/// Everything one annotation carries.
#[derive(Debug, Clone, Default)]
pub(crate) struct RuleSet {
    pub entries: Vec<RuleEntry>,
    pub text: Option<String>,
}

enum Partial {
    Object {
        begin: LexEvent,
        entries: Vec<RuleEntry>,
        key: Option<(String, LexEvent)>,
    },
    Array {
        begin: LexEvent,
        items: Vec<RuleValue>,
    },
}

/// Builds one rule value tree from value events.
#[derive(Default)]
struct ValueBuilder {
    stack: Vec<Partial>,
}

impl ValueBuilder {
    /// Feeds one event; returns the value once its last event arrived.
    fn feed(&mut self, lex: &LexEvent) -> SchemaResult<Option<RuleValue>> {
        match lex.kind() {
            LexEventType::LiteralBegin
            | LexEventType::ObjectKeyBegin
            | LexEventType::ObjectValueBegin
            | LexEventType::ObjectValueEnd
            | LexEventType::ArrayItemBegin
            | LexEventType::ArrayItemEnd => Ok(None),
            LexEventType::LiteralEnd => self.complete(RuleValue::Literal(lex.clone()), lex),
            LexEventType::ObjectBegin => {
                self.stack.push(Partial::Object {
                    begin: lex.clone(),
                    entries: Vec::new(),
                    key: None,
                });
                Ok(None)
            }
            LexEventType::ArrayBegin => {
                self.stack.push(Partial::Array {
                    begin: lex.clone(),
                    items: Vec::new(),
                });
                Ok(None)
            }
            LexEventType::ObjectKeyEnd => match self.stack.last_mut() {
                Some(Partial::Object { key, .. }) => {
                    *key = Some((key_text(lex)?, lex.clone()));
                    Ok(None)
                }
                _ => Err(unexpected(lex)),
            },
            LexEventType::ObjectEnd => match self.stack.pop() {
                Some(Partial::Object { begin, entries, .. }) => {
                    let whole = LexEvent::new(lex.kind(), begin.begin(), lex.end(), lex.file().clone());
                    self.complete(RuleValue::Object(entries, whole), lex)
                }
                _ => Err(unexpected(lex)),
            },
            LexEventType::ArrayEnd => match self.stack.pop() {
                Some(Partial::Array { begin, items }) => {
                    let whole = LexEvent::new(lex.kind(), begin.begin(), lex.end(), lex.file().clone());
                    self.complete(RuleValue::Array(items, whole), lex)
                }
                _ => Err(unexpected(lex)),
            },
            _ => Err(unexpected(lex)),
        }
    }

    fn complete(&mut self, value: RuleValue, lex: &LexEvent) -> SchemaResult<Option<RuleValue>> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(Partial::Array { items, .. }) => {
                items.push(value);
                Ok(None)
            }
            Some(Partial::Object { entries, key, .. }) => {
                let (key, key_lex) = key.take().ok_or_else(|| unexpected(lex))?;
                entries.push(RuleEntry {
                    key,
                    key_lex,
                    value,
                });
                Ok(None)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Rules,
    AfterRules,
    Text,
    Done,
}

/// Consumes the events of one annotation after its opening event.
pub(crate) struct RuleLoader {
    state: State,
    builder: ValueBuilder,
    set: RuleSet,
}

impl RuleLoader {
    pub fn new() -> Self {
        Self {
            state: State::Begin,
            builder: ValueBuilder::default(),
            set: RuleSet::default(),
        }
    }

    /// Feeds one event; returns the rule set when the annotation closes.
    pub fn feed(&mut self, lex: &LexEvent) -> SchemaResult<Option<RuleSet>> {
        match (self.state, lex.kind()) {
            (State::Begin, LexEventType::ObjectBegin) => {
                self.state = State::Rules;
                self.rules(lex)
            }
            (State::Rules, _) => self.rules(lex),
            (
                State::Begin | State::AfterRules,
                LexEventType::InlineAnnotationTextBegin | LexEventType::MultiLineAnnotationTextBegin,
            ) => {
                self.state = State::Text;
                Ok(None)
            }
            (
                State::Text,
                LexEventType::InlineAnnotationTextEnd | LexEventType::MultiLineAnnotationTextEnd,
            ) => {
                let text = lex.text().trim().to_string();
                if !text.is_empty() {
                    self.set.text = Some(text);
                }
                self.state = State::AfterRules;
                Ok(None)
            }
            (
                State::Begin | State::AfterRules,
                LexEventType::InlineAnnotationEnd | LexEventType::MultiLineAnnotationEnd,
            ) => {
                self.state = State::Done;
                Ok(Some(std::mem::take(&mut self.set)))
            }
            _ => Err(unexpected(lex)),
        }
    }

    fn rules(&mut self, lex: &LexEvent) -> SchemaResult<Option<RuleSet>> {
        match self.builder.feed(lex)? {
            Some(RuleValue::Object(entries, _)) => {
                self.set.entries = entries;
                self.state = State::AfterRules;
            }
            Some(other) => return Err(unexpected(other.lex())),
            None => {}
        }
        Ok(None)
    }
}

/// Rule and key names may be bare or quoted.
fn key_text(lex: &LexEvent) -> SchemaResult<String> {
    if lex.value().first() == Some(&b'"') {
        unquote(lex.value()).map_err(|e| e.or_at(lex))
    } else {
        Ok(lex.text())
    }
}

fn unexpected(lex: &LexEvent) -> SchemaError {
    SchemaError::at_lex(ErrorKind::Loader(lex.kind().to_string()), lex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use crate::source::SourceFile;

    /// Scans `text` and feeds the events of its first annotation.
    fn rule_set(text: &str) -> RuleSet {
        let mut scanner = Scanner::new(SourceFile::anonymous(text));
        let mut loader = None;
        while let Some(lex) = scanner.next().unwrap() {
            match lex.kind() {
                LexEventType::InlineAnnotationBegin | LexEventType::MultiLineAnnotationBegin => {
                    loader = Some(RuleLoader::new());
                }
                LexEventType::NewLine => {}
                _ => {
                    if let Some(rules) = loader.as_mut() {
                        if let Some(set) = rules.feed(&lex).unwrap() {
                            return set;
                        }
                    }
                }
            }
        }
        panic!("no annotation in {:?}", text);
    }

    #[test]
    fn test_rules_keep_order_and_positions() {
        let set = rule_set("1 // {min: 0, \"max\": 5} - a number");
        let keys: Vec<_> = set.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["min", "max"]);
        assert_eq!(set.text.as_deref(), Some("a number"));
        assert_eq!(set.entries[0].key_lex.begin(), 6);
        assert_eq!(set.entries[1].value.lex().text(), "5");
    }

    #[test]
    fn test_nested_values() {
        let set = rule_set("1 // {or: [{type: \"integer\", min: 1}, \"@cat\"]}");
        match &set.entries[0].value {
            RuleValue::Array(items, _) => {
                assert_eq!(items.len(), 2);
                match &items[0] {
                    RuleValue::Object(entries, lex) => {
                        assert_eq!(entries.len(), 2);
                        assert!(lex.text().starts_with('{'));
                        assert!(lex.text().ends_with('}'));
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_text_only() {
        let set = rule_set("1 // just a note");
        assert!(set.entries.is_empty());
        assert_eq!(set.text.as_deref(), Some("just a note"));
    }

    #[test]
    fn test_multi_line() {
        let set = rule_set("1 /* {\n  min: 0\n} */");
        assert_eq!(set.entries.len(), 1);
        assert!(set.text.is_none());
    }
}
