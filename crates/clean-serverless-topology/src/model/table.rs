use serde::Serialize;

/// Partition key attribute declared on the record store
pub const PARTITION_KEY: &str = "PK";
/// Sort key attribute declared on the record store
pub const SORT_KEY: &str = "SK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

impl AttributeType {
    /// DynamoDB attribute type code
    pub fn code(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::String,
        }
    }
}

/// On-demand capacity; there is no provisioned throughput to size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    PayPerRequest,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::PayPerRequest => "PAY_PER_REQUEST",
        }
    }
}

/// What happens to a resource's data when the stack is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

impl RemovalPolicy {
    /// CloudFormation `DeletionPolicy` / `UpdateReplacePolicy` value
    pub fn as_policy(&self) -> &'static str {
        match self {
            RemovalPolicy::Destroy => "Delete",
            RemovalPolicy::Retain => "Retain",
        }
    }
}

/// Keyed record store with a composite `(PK, SK)` identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDecl {
    pub logical_id: String,
    /// `None` leaves naming to the provisioning engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub billing_mode: BillingMode,
    pub removal_policy: RemovalPolicy,
}

impl TableDecl {
    /// An empty name is treated like no name.
    pub fn new(table_name: Option<String>) -> Self {
        Self {
            logical_id: "ResourceTable".to_string(),
            table_name: table_name.filter(|name| !name.is_empty()),
            partition_key: KeyAttribute::string(PARTITION_KEY),
            sort_key: KeyAttribute::string(SORT_KEY),
            billing_mode: BillingMode::PayPerRequest,
            removal_policy: RemovalPolicy::Destroy,
        }
    }
}
