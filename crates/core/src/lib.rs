#![forbid(unsafe_code)]

pub mod tree;

pub mod ids {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use uuid::Uuid;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BlockId(Uuid);

    impl BlockId {
        pub fn new_v4() -> Self {
            Self(Uuid::new_v4())
        }

        pub fn from_uuid(value: Uuid) -> Self {
            Self(value)
        }

        pub fn as_uuid(&self) -> &Uuid {
            &self.0
        }

        pub fn parse(value: &str) -> Result<Self, IdError> {
            parse_uuid(value).map(Self)
        }
    }

    impl fmt::Display for BlockId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl FromStr for BlockId {
        type Err = IdError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            Self::parse(value)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct WorkspaceId(Uuid);

    impl WorkspaceId {
        pub fn new_v4() -> Self {
            Self(Uuid::new_v4())
        }

        pub fn from_uuid(value: Uuid) -> Self {
            Self(value)
        }

        pub fn as_uuid(&self) -> &Uuid {
            &self.0
        }

        pub fn parse(value: &str) -> Result<Self, IdError> {
            parse_uuid(value).map(Self)
        }
    }

    impl fmt::Display for WorkspaceId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl FromStr for WorkspaceId {
        type Err = IdError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            Self::parse(value)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum IdError {
        Empty,
        Malformed,
    }

    impl IdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "id must not be empty",
                Self::Malformed => "id must be a uuid",
            }
        }
    }

    impl fmt::Display for IdError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    impl std::error::Error for IdError {}

    fn parse_uuid(value: &str) -> Result<Uuid, IdError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        Uuid::parse_str(value).map_err(|_| IdError::Malformed)
    }
}

pub mod model {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    /// Open key-value document attached to every block. Its schema depends on the kind.
    pub type Properties = serde_json::Map<String, serde_json::Value>;

    /// Shallow, key-wise merge: keys in `patch` overwrite, all other keys are kept.
    pub fn merge_properties(base: &mut Properties, patch: Properties) {
        for (key, value) in patch {
            base.insert(key, value);
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum BlockKind {
        #[serde(rename = "root_block")]
        RootBlock,
        #[serde(rename = "page")]
        Page,
        #[serde(rename = "text")]
        Text,
        #[serde(rename = "heading_1")]
        Heading1,
        #[serde(rename = "heading_2")]
        Heading2,
        #[serde(rename = "heading_3")]
        Heading3,
        #[serde(rename = "bullet_list")]
        BulletList,
        #[serde(rename = "numbered_list")]
        NumberedList,
        #[serde(rename = "to_do")]
        ToDo,
        #[serde(rename = "toggle")]
        Toggle,
        #[serde(rename = "code")]
        Code,
        #[serde(rename = "image")]
        Image,
        #[serde(rename = "file")]
        File,
    }

    impl BlockKind {
        pub const ALL: [BlockKind; 13] = [
            BlockKind::RootBlock,
            BlockKind::Page,
            BlockKind::Text,
            BlockKind::Heading1,
            BlockKind::Heading2,
            BlockKind::Heading3,
            BlockKind::BulletList,
            BlockKind::NumberedList,
            BlockKind::ToDo,
            BlockKind::Toggle,
            BlockKind::Code,
            BlockKind::Image,
            BlockKind::File,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                BlockKind::RootBlock => "root_block",
                BlockKind::Page => "page",
                BlockKind::Text => "text",
                BlockKind::Heading1 => "heading_1",
                BlockKind::Heading2 => "heading_2",
                BlockKind::Heading3 => "heading_3",
                BlockKind::BulletList => "bullet_list",
                BlockKind::NumberedList => "numbered_list",
                BlockKind::ToDo => "to_do",
                BlockKind::Toggle => "toggle",
                BlockKind::Code => "code",
                BlockKind::Image => "image",
                BlockKind::File => "file",
            }
        }

        pub fn from_name(value: &str) -> Option<Self> {
            let value = value.trim();
            Self::ALL.into_iter().find(|kind| kind.as_str() == value)
        }

        pub fn parse(value: &str) -> Result<Self, BlockKindError> {
            Self::from_name(value).ok_or_else(|| BlockKindError {
                value: value.to_string(),
            })
        }

        /// Kinds whose payload lives in the file store rather than in `properties`.
        pub fn is_file_backed(self) -> bool {
            matches!(self, BlockKind::Image | BlockKind::File)
        }
    }

    impl fmt::Display for BlockKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for BlockKind {
        type Err = BlockKindError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            Self::parse(value)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct BlockKindError {
        pub value: String,
    }

    impl fmt::Display for BlockKindError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "unknown block kind: {}", self.value)
        }
    }

    impl std::error::Error for BlockKindError {}

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn block_kind_round_trips_through_str_and_serde() {
            for kind in BlockKind::ALL {
                assert_eq!(BlockKind::from_name(kind.as_str()), Some(kind));
                assert_eq!(kind.as_str().parse::<BlockKind>(), Ok(kind));
                let encoded = serde_json::to_value(kind).unwrap();
                assert_eq!(encoded, json!(kind.as_str()));
            }
            assert_eq!(BlockKind::from_name(" heading_2 "), Some(BlockKind::Heading2));
            assert_eq!(BlockKind::from_name("heading2"), None);
            assert_eq!(BlockKind::parse("video").unwrap_err().value, "video");
        }

        #[test]
        fn only_image_and_file_are_file_backed() {
            let backed: Vec<_> = BlockKind::ALL
                .into_iter()
                .filter(|kind| kind.is_file_backed())
                .collect();
            assert_eq!(backed, vec![BlockKind::Image, BlockKind::File]);
        }

        #[test]
        fn merge_properties_is_shallow() {
            let mut base = json!({"title": "a", "style": {"bold": true}, "keep": 1})
                .as_object()
                .cloned()
                .unwrap();
            let patch = json!({"title": "b", "style": {"italic": true}})
                .as_object()
                .cloned()
                .unwrap();
            merge_properties(&mut base, patch);
            assert_eq!(
                serde_json::Value::Object(base),
                json!({"title": "b", "style": {"italic": true}, "keep": 1})
            );
        }
    }
}

#[cfg(test)]
mod id_tests {
    use super::ids::*;

    #[test]
    fn ids_parse_and_display_hyphenated() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let block = BlockId::parse(raw).unwrap();
        assert_eq!(block.to_string(), raw);
        let workspace: WorkspaceId = format!("  {raw} ").parse().unwrap();
        assert_eq!(workspace.to_string(), raw);
    }

    #[test]
    fn id_parse_errors_are_typed() {
        assert_eq!(BlockId::parse("").unwrap_err(), IdError::Empty);
        assert_eq!(BlockId::parse("   ").unwrap_err(), IdError::Empty);
        assert_eq!(BlockId::parse("BLOCK-1").unwrap_err(), IdError::Malformed);
        assert_ne!(BlockId::new_v4(), BlockId::new_v4());
    }
}
