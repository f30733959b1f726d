use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// What a statement applies to. Table and bucket resources are resolved to
/// ARNs at synthesis time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyResource {
    Any,
    Table { logical_id: String },
    TableIndexes { logical_id: String },
    Bucket { name: String },
    BucketObjects { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<PolicyResource>,
}

const BUCKET_READ_WRITE_ACTIONS: &[&str] = &[
    "s3:GetObject*",
    "s3:GetBucket*",
    "s3:List*",
    "s3:DeleteObject*",
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: Vec<PolicyResource>) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    /// Every table action on the table and its indexes
    pub fn table_full_access(table_id: &str) -> Self {
        Self::allow(
            &["dynamodb:*"],
            vec![
                PolicyResource::Table {
                    logical_id: table_id.to_string(),
                },
                PolicyResource::TableIndexes {
                    logical_id: table_id.to_string(),
                },
            ],
        )
    }

    /// Unrestricted table and log actions on every resource
    pub fn storage_and_logs() -> Self {
        Self::allow(&["dynamodb:*", "logs:*"], vec![PolicyResource::Any])
    }

    /// Object read/write on one bucket
    pub fn bucket_read_write(bucket_name: &str) -> Self {
        Self::allow(
            BUCKET_READ_WRITE_ACTIONS,
            vec![
                PolicyResource::Bucket {
                    name: bucket_name.to_string(),
                },
                PolicyResource::BucketObjects {
                    name: bucket_name.to_string(),
                },
            ],
        )
    }

    pub fn grants(&self, action: &str) -> bool {
        self.effect == Effect::Allow && self.actions.iter().any(|a| a == action)
    }
}
