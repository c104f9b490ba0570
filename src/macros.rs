/// Construct a BSON value
///
/// Arrays and documents nest with JSON-like syntax; any other value is an expression
/// convertible into [`Bson`](crate::Bson).
///
/// ```
/// use bson_codec::{bson, Bson};
///
/// let value = bson!({ "list": [1, "two", null], "nested": { "x": -1 } });
/// assert!(matches!(value, Bson::Document(_)));
/// ```
#[macro_export]
macro_rules! bson {
    (@array $array:ident) => {};

    (@array $array:ident [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $array.push($crate::bson!([$($inner)*]));
        $crate::bson!(@array $array $($($rest)*)?);
    };

    (@array $array:ident {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $array.push($crate::bson!({$($inner)*}));
        $crate::bson!(@array $array $($($rest)*)?);
    };

    (@array $array:ident null $(, $($rest:tt)*)?) => {
        $array.push($crate::Bson::Null);
        $crate::bson!(@array $array $($($rest)*)?);
    };

    (@array $array:ident $value:expr $(, $($rest:tt)*)?) => {
        $array.push($crate::bson!($value));
        $crate::bson!(@array $array $($($rest)*)?);
    };

    (null) => {{ $crate::Bson::Null }};

    ([]) => {{ $crate::Bson::Array(Vec::new()) }};

    ([$($inner:tt)+]) => {{
        let mut array: Vec<$crate::Bson> = Vec::new();
        $crate::bson!(@array array $($inner)+);
        $crate::Bson::Array(array)
    }};

    ({$($inner:tt)*}) => {{
        $crate::Bson::Document($crate::doc! { $($inner)* })
    }};

    ($value:expr) => {{
        <$crate::Bson as ::std::convert::From<_>>::from($value)
    }};
}

/// Construct a BSON Document
///
/// Keys are single tokens, usually string literals. Values follow the rules of [`bson!`].
///
/// ```
/// use bson_codec::doc;
///
/// let doc = doc! { "a": 1, "b": "hi", "c": [true, -2], "d": { "e": null } };
/// assert_eq!(doc.len(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    (@entries $document:ident) => {};

    (@entries $document:ident $key:tt : [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $document.insert($key, $crate::bson!([$($inner)*]));
        $crate::doc!(@entries $document $($($rest)*)?);
    };

    (@entries $document:ident $key:tt : {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $document.insert($key, $crate::bson!({$($inner)*}));
        $crate::doc!(@entries $document $($($rest)*)?);
    };

    (@entries $document:ident $key:tt : null $(, $($rest:tt)*)?) => {
        $document.insert($key, $crate::Bson::Null);
        $crate::doc!(@entries $document $($($rest)*)?);
    };

    (@entries $document:ident $key:tt : $value:expr $(, $($rest:tt)*)?) => {
        $document.insert($key, $crate::bson!($value));
        $crate::doc!(@entries $document $($($rest)*)?);
    };

    () => {{ $crate::Document::new() }};

    ($($entries:tt)+) => {{
        let mut document = $crate::Document::new();
        $crate::doc!(@entries document $($entries)+);
        document
    }};
}
