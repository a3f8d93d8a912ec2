//! Call-site arguments, positional and matched against the declared parameters.

use micro_call::protocol::RequestBody;
use serde::Serialize;

/// The value passed for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// No value. Skipped by query, header and field parameters, rejected by the others.
    Absent,
    Text(String),
    /// Repeats the parameter once per item.
    List(Vec<String>),
    /// Name/value pairs for the map parameters, kept in order.
    Pairs(Vec<(String, String)>),
    Body(RequestBody),
}

impl ArgValue {
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        ArgValue::List(items.into_iter().map(|item| item.to_string()).collect())
    }

    pub fn pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        ArgValue::Pairs(pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    /// Serializes `value` as a JSON request body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(|bytes| ArgValue::Body(RequestBody::json(bytes)))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ArgValue::Absent => "absent",
            ArgValue::Text(_) => "text",
            ArgValue::List(_) => "list",
            ArgValue::Pairs(_) => "pairs",
            ArgValue::Body(_) => "body",
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<RequestBody> for ArgValue {
    fn from(body: RequestBody) -> Self {
        ArgValue::Body(body)
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(items: Vec<String>) -> Self {
        ArgValue::List(items)
    }
}

impl From<Vec<(String, String)>> for ArgValue {
    fn from(pairs: Vec<(String, String)>) -> Self {
        ArgValue::Pairs(pairs)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Absent, Into::into)
    }
}

macro_rules! text_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(value: $ty) -> Self {
                    ArgValue::Text(value.to_string())
                }
            }
        )*
    };
}

text_from_display!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// The positional arguments of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<ArgValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn push(&mut self, value: impl Into<ArgValue>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArgValue> {
        self.values.iter()
    }
}

impl From<Vec<ArgValue>> for Arguments {
    fn from(values: Vec<ArgValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<ArgValue> for Arguments {
    fn from_iter<I: IntoIterator<Item = ArgValue>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a ArgValue;
    type IntoIter = std::slice::Iter<'a, ArgValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::{ArgValue, Arguments};

    #[derive(Serialize)]
    struct NewUser<'a> {
        name: &'a str,
    }

    #[test]
    fn conversions() {
        assert_eq!(ArgValue::from(42), ArgValue::Text("42".into()));
        assert_eq!(ArgValue::from(true), ArgValue::Text("true".into()));
        assert_eq!(ArgValue::from(None::<&str>), ArgValue::Absent);
        assert_eq!(ArgValue::from(Some("x")), ArgValue::Text("x".into()));
        assert_eq!(ArgValue::list([1, 2]), ArgValue::List(vec!["1".into(), "2".into()]));
        assert_eq!(ArgValue::pairs([("a", 1)]), ArgValue::Pairs(vec![("a".into(), "1".into())]));
    }

    #[test]
    fn json_body() {
        let ArgValue::Body(body) = ArgValue::json(&NewUser { name: "ann" }).unwrap() else {
            panic!("expected a body");
        };
        assert_eq!(body.bytes().as_ref(), br#"{"name":"ann"}"#);
        assert_eq!(body.content_type(), Some(&mime::APPLICATION_JSON));
    }

    #[test]
    fn positional() {
        let args = Arguments::new().arg(42).arg(None::<String>).arg("x");
        assert_eq!(args.len(), 3);
        assert_eq!(args.get(1), Some(&ArgValue::Absent));
        assert_eq!(args.iter().map(ArgValue::kind).collect::<Vec<_>>(), vec!["text", "absent", "text"]);
    }
}
