//! Conversion of a filter tree to and from the opaque token carried by the `filter` query
//! parameter.
//!
//! A token is the JSON form of the root group, encoded with the URL-safe base64 alphabet and
//! without padding so it can be dropped into a query string as is.
use crate::{
    error::FilterError,
    mutation::node_ids,
    tree::{FilterGroup, NodeId},
};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use itertools::Itertools;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a tree into a URL-safe token.
///
/// # Examples
///
/// ```rust
/// use build_filter::{deserialize, serialize, FilterGroup};
///
/// let root = FilterGroup::empty_root();
/// let token = serialize(&root).unwrap();
/// assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// assert_eq!(root, deserialize(&token).unwrap());
/// ```
pub fn serialize(root: &FilterGroup) -> Result<String, FilterError> {
    let json = serde_json::to_vec(root).map_err(FilterError::Encode)?;
    Ok(TOKEN_ENGINE.encode(json))
}

/// Decode a token produced by [`serialize`].
///
/// Fails with [`FilterError::MalformedToken`] when the token is not valid base64, does not hold
/// a filter group, has a root that is not the `root` node or reuses a node id.
pub fn deserialize(token: &str) -> Result<FilterGroup, FilterError> {
    let bytes = TOKEN_ENGINE
        .decode(token.trim())
        .map_err(|error| FilterError::malformed(format!("invalid base64: {error}")))?;
    let root: FilterGroup = serde_json::from_slice(&bytes)
        .map_err(|error| FilterError::malformed(format!("invalid filter group: {error}")))?;
    validate(&root)?;
    Ok(root)
}

fn validate(root: &FilterGroup) -> Result<(), FilterError> {
    if !root.id.is_root() {
        return Err(FilterError::malformed(format!(
            "root group has id '{}' instead of '{}'",
            root.id,
            NodeId::ROOT
        )));
    }

    if let Some(duplicate) = node_ids(root).into_iter().duplicates().next() {
        return Err(FilterError::malformed(format!(
            "node id '{duplicate}' is used more than once"
        )));
    }

    Ok(())
}
