// ============================================================================
// objekt - Value Macros
// ============================================================================

/// Build a sequence [`Value`](crate::Value).
///
/// ```rust
/// use objekt::{sequence, Value};
///
/// let v = sequence![1, "two", true];
/// assert_eq!(v.as_object().unwrap().len(), 3);
/// assert_eq!(sequence![], Value::sequence(Vec::<Value>::new()));
/// ```
#[macro_export]
macro_rules! sequence {
    () => {
        $crate::Value::sequence(::std::vec::Vec::<$crate::Value>::new())
    };
    ($($item:expr),+ $(,)?) => {
        $crate::Value::sequence([$($crate::Value::from($item)),+])
    };
}

/// Build a plain mapping [`Value`](crate::Value). Keys keep the order given.
///
/// ```rust
/// use objekt::{mapping, sequence};
///
/// let v = mapping! {
///     "name" => "objekt",
///     "tags" => sequence!["reactive"],
/// };
/// assert_eq!(v.as_object().unwrap().get("name").unwrap().as_str(), Some("objekt"));
/// ```
#[macro_export]
macro_rules! mapping {
    () => {
        $crate::Value::mapping(::std::vec::Vec::<(::std::string::String, $crate::Value)>::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Value::mapping([
            $((::std::string::String::from($key), $crate::Value::from($value))),+
        ])
    };
}

/// Clone variables into a move closure, for handlers that need their own
/// handles.
///
/// ```rust
/// use objekt::{cloned, mapping, ChangeEvent, ReactiveContainer};
///
/// let source = ReactiveContainer::new(mapping! { "x" => 1 });
/// let mirror = ReactiveContainer::mapping();
///
/// source.on("change", cloned!(mirror => move |e: &ChangeEvent| {
///     mirror.set(e.key.clone(), e.value.clone());
/// }));
///
/// source.set("x", 2);
/// assert_eq!(mirror.get("x").as_f64(), Some(2.0));
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}
