//! Serializers for the diesel wrapper types, which carry no serde support of their own.

use serde::Serializer;

pub(crate) fn date<S: Serializer>(
    value: &jiff_diesel::Date,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.to_jiff())
}

pub(crate) fn timestamp<S: Serializer>(
    value: &jiff_diesel::Timestamp,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.to_jiff())
}
